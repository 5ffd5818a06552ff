//! `aivis analytics` — read-side aggregations over stored check history.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use aivis_visibility::VisibilityCheck;

/// Rows loaded per computation; matches the server's analytics bound.
const ROW_LIMIT: i64 = 10_000;

async fn load_window(
    pool: &PgPool,
    shop_slug: &str,
    days: u32,
) -> anyhow::Result<(i64, Vec<VisibilityCheck>)> {
    let shop = aivis_db::get_shop_by_slug(pool, shop_slug).await?;
    let since = Utc::now() - Duration::days(i64::from(days));
    let checks = aivis_db::list_visibility_checks(pool, shop.id, Some(since), ROW_LIMIT).await?;
    Ok((shop.id, checks))
}

pub(crate) async fn trend(pool: &PgPool, shop_slug: &str, days: u32) -> anyhow::Result<()> {
    let (_, checks) = load_window(pool, shop_slug, days).await?;
    let trend = aivis_analytics::trend_data(&checks, days, Utc::now());
    println!("{}", serde_json::to_string_pretty(&trend)?);
    Ok(())
}

pub(crate) async fn share_of_voice(
    pool: &PgPool,
    shop_slug: &str,
    days: u32,
) -> anyhow::Result<()> {
    let shop = aivis_db::get_shop_by_slug(pool, shop_slug).await?;
    let since = Utc::now() - Duration::days(i64::from(days));
    let checks = aivis_db::list_visibility_checks(pool, shop.id, Some(since), ROW_LIMIT).await?;
    let sov = aivis_analytics::share_of_voice(&checks, &shop.competitors, days, Utc::now());
    println!("{}", serde_json::to_string_pretty(&sov)?);
    Ok(())
}

pub(crate) async fn positions(pool: &PgPool, shop_slug: &str, days: u32) -> anyhow::Result<()> {
    let (_, checks) = load_window(pool, shop_slug, days).await?;
    let history = aivis_analytics::position_history(&checks, days, Utc::now());
    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}

//! Quota reads: plan limits against counted rows.
//!
//! Quota is a derived view. Nothing here maintains a counter; every read
//! counts the underlying records in the current period window, which
//! sidesteps the dual-write consistency problem of keeping a counter in
//! sync with the rows it counts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use aivis_core::Plan;

use crate::shops::ShopRow;
use crate::DbError;

/// One metered resource: rows used against the plan limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaItem {
    pub used: u64,
    pub limit: u64,
}

/// Usage across every metered resource for one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaReport {
    pub plan_id: String,
    pub products_audited: QuotaItem,
    pub visibility_checks: QuotaItem,
    pub optimizations: QuotaItem,
    pub competitors_tracked: QuotaItem,
}

/// Compute the shop's quota usage for the period starting at `period_start`
/// (the first of the current calendar month for monthly meters).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any count query fails.
pub async fn quota_report(
    pool: &PgPool,
    shop: &ShopRow,
    plan: &Plan,
    period_start: DateTime<Utc>,
) -> Result<QuotaReport, DbError> {
    let audited: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_audits WHERE shop_id = $1")
            .bind(shop.id)
            .fetch_one(pool)
            .await?;

    let checks = crate::checks::count_visibility_checks_since(pool, shop.id, period_start).await?;

    let optimizations: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM optimizations WHERE shop_id = $1 AND applied_at >= $2",
    )
    .bind(shop.id)
    .bind(period_start)
    .fetch_one(pool)
    .await?;

    Ok(QuotaReport {
        plan_id: plan.id.clone(),
        products_audited: QuotaItem {
            used: u64::try_from(audited).unwrap_or(0),
            limit: u64::from(plan.products_audited),
        },
        visibility_checks: QuotaItem {
            used: checks,
            limit: u64::from(plan.visibility_checks_per_month),
        },
        optimizations: QuotaItem {
            used: u64::try_from(optimizations).unwrap_or(0),
            limit: u64::from(plan.optimizations_per_month),
        },
        competitors_tracked: QuotaItem {
            used: shop.competitors.len() as u64,
            limit: plan.competitors_tracked as u64,
        },
    })
}

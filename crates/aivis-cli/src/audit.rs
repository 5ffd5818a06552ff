//! `aivis audit` — run one catalog audit and print the outcome.

use sqlx::PgPool;

use aivis_audit::{CatalogClient, ShopCatalog};
use aivis_core::{AppConfig, PlanCatalog};
use aivis_db::PgAuditStore;

pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    plans: &PlanCatalog,
    shop_slug: &str,
) -> anyhow::Result<()> {
    let (shop, plan) = crate::load_shop_and_plan(pool, plans, shop_slug).await?;

    let client = CatalogClient::new(
        config.catalog_request_timeout_secs,
        &config.catalog_user_agent,
        config.catalog_max_retries,
        config.catalog_retry_backoff_base_secs,
    )?;
    let source = ShopCatalog::new(client, shop.catalog_url.clone(), config.catalog_page_size);
    let store = PgAuditStore::new(pool.clone());

    let outcome = aivis_audit::run_audit(
        shop.id,
        &plan,
        &source,
        &store,
        config.catalog_inter_page_delay_ms,
    )
    .await?;

    let output = serde_json::json!({
        "shop": shop.slug,
        "summary": outcome.summary,
        "plan_info": outcome.plan_info,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

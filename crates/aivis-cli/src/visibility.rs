//! `aivis visibility` — run one visibility check and print the results.

use sqlx::PgPool;

use aivis_core::{AppConfig, PlanCatalog};
use aivis_db::PgCheckStore;
use aivis_visibility::{ChatCompletionClient, PlatformSet, VisibilityTarget};

pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    plans: &PlanCatalog,
    shop_slug: &str,
    queries: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let (shop, plan) = crate::load_shop_and_plan(pool, plans, shop_slug).await?;

    let platforms = PlatformSet::from_env();
    if platforms.is_empty() {
        anyhow::bail!("no platform API keys configured (AIVIS_<PLATFORM>_API_KEY)");
    }

    let client = ChatCompletionClient::new(config.platform_request_timeout_secs)?;
    let store = PgCheckStore::new(pool.clone());
    let target = VisibilityTarget {
        shop_id: shop.id,
        brand_name: &shop.brand_name,
        competitors: &shop.competitors,
        vertical: &shop.vertical,
    };

    let run =
        aivis_visibility::run_visibility_check(target, &plan, &platforms, &client, &store, queries)
            .await?;

    let output = serde_json::json!({
        "shop": shop.slug,
        "checks": run.checks,
        "failures": run.failures,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

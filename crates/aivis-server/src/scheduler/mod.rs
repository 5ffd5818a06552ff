//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring audit and visibility jobs. Per-shop failures are logged and
//! skipped; a job never takes the server down.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use aivis_audit::{CatalogClient, ShopCatalog};
use aivis_core::{AppConfig, PlanCatalog};
use aivis_db::{PgAuditStore, PgCheckStore};
use aivis_visibility::{ChatCompletionClient, PlatformSet, VisibilityTarget};

/// Everything the recurring jobs need, shared across firings.
#[derive(Clone)]
pub struct SchedulerContext {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub plans: Arc<PlanCatalog>,
    pub platforms: Arc<PlatformSet>,
    pub catalog_client: CatalogClient,
    pub chat_client: ChatCompletionClient,
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(ctx: SchedulerContext) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_visibility_job(&scheduler, ctx.clone()).await?;
    register_audit_job(&scheduler, ctx).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the nightly visibility run (02:10 UTC) for every active shop.
async fn register_visibility_job(
    scheduler: &JobScheduler,
    ctx: SchedulerContext,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 10 2 * * *", move |_uuid, _lock| {
        let ctx = ctx.clone();
        Box::pin(async move {
            tracing::info!("scheduler: starting nightly visibility run");
            run_visibility_for_all_shops(&ctx).await;
            tracing::info!("scheduler: nightly visibility run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Register the weekly catalog audit (Sunday 03:00 UTC) for every active shop.
async fn register_audit_job(
    scheduler: &JobScheduler,
    ctx: SchedulerContext,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 3 * * SUN", move |_uuid, _lock| {
        let ctx = ctx.clone();
        Box::pin(async move {
            tracing::info!("scheduler: starting weekly audit run");
            run_audit_for_all_shops(&ctx).await;
            tracing::info!("scheduler: weekly audit run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_visibility_for_all_shops(ctx: &SchedulerContext) {
    let shops = match aivis_db::list_active_shops(&ctx.pool).await {
        Ok(shops) => shops,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load active shops");
            return;
        }
    };

    let store = PgCheckStore::new(ctx.pool.clone());

    for shop in shops {
        let Some(plan) = ctx.plans.get(&shop.plan_id) else {
            tracing::error!(shop = %shop.slug, plan = %shop.plan_id, "scheduler: unknown plan; skipping");
            continue;
        };

        let target = VisibilityTarget {
            shop_id: shop.id,
            brand_name: &shop.brand_name,
            competitors: &shop.competitors,
            vertical: &shop.vertical,
        };

        match aivis_visibility::run_visibility_check(
            target,
            plan,
            &ctx.platforms,
            &ctx.chat_client,
            &store,
            None,
        )
        .await
        {
            Ok(run) => {
                tracing::info!(
                    shop = %shop.slug,
                    checks = run.checks.len(),
                    failures = run.failures.len(),
                    "scheduler: visibility run finished"
                );
            }
            Err(e) => {
                // Quota rejections are expected near month end; others are not.
                tracing::warn!(shop = %shop.slug, error = %e, "scheduler: visibility run skipped");
            }
        }
    }
}

async fn run_audit_for_all_shops(ctx: &SchedulerContext) {
    let shops = match aivis_db::list_active_shops(&ctx.pool).await {
        Ok(shops) => shops,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load active shops");
            return;
        }
    };

    let store = PgAuditStore::new(ctx.pool.clone());

    for shop in shops {
        let Some(plan) = ctx.plans.get(&shop.plan_id) else {
            tracing::error!(shop = %shop.slug, plan = %shop.plan_id, "scheduler: unknown plan; skipping");
            continue;
        };

        let source = ShopCatalog::new(
            ctx.catalog_client.clone(),
            shop.catalog_url.clone(),
            ctx.config.catalog_page_size,
        );

        match aivis_audit::run_audit(
            shop.id,
            plan,
            &source,
            &store,
            ctx.config.catalog_inter_page_delay_ms,
        )
        .await
        {
            Ok(outcome) => {
                tracing::info!(
                    shop = %shop.slug,
                    audited = outcome.summary.audited_products,
                    average_score = outcome.summary.average_score,
                    "scheduler: audit finished"
                );
            }
            Err(e) => {
                tracing::warn!(shop = %shop.slug, error = %e, "scheduler: audit failed; will retry next cycle");
            }
        }
    }
}

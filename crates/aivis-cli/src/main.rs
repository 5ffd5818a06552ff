mod analytics;
mod audit;
mod shops;
mod visibility;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use aivis_core::{Plan, PlanCatalog};
use aivis_db::ShopRow;

#[derive(Debug, Parser)]
#[command(name = "aivis")]
#[command(about = "AIVIS command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a catalog audit for one shop and print the summary.
    Audit {
        #[arg(long)]
        shop: String,
    },
    /// Run a visibility check for one shop and print the results.
    Visibility {
        #[arg(long)]
        shop: String,
        /// Custom queries; replaces the default set when given.
        #[arg(long = "query")]
        queries: Vec<String>,
    },
    /// Read analytics over stored check history.
    Analytics {
        #[command(subcommand)]
        kind: AnalyticsKind,
    },
    /// List registered shops.
    Shops,
}

#[derive(Debug, Subcommand)]
enum AnalyticsKind {
    /// Daily mention-rate trend.
    Trend {
        #[arg(long)]
        shop: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Brand share of voice against tracked competitors.
    ShareOfVoice {
        #[arg(long)]
        shop: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Average list position over time.
    Positions {
        #[arg(long)]
        shop: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = aivis_core::load_app_config()?;
    let plans = aivis_core::load_plans(&config.plans_path)?;

    let pool = aivis_db::connect_pool(
        &config.database_url,
        aivis_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("failed to connect to database")?;
    aivis_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Audit { shop } => audit::run(&pool, &config, &plans, &shop).await,
        Commands::Visibility { shop, queries } => {
            let queries = if queries.is_empty() {
                None
            } else {
                Some(queries)
            };
            visibility::run(&pool, &config, &plans, &shop, queries).await
        }
        Commands::Analytics { kind } => match kind {
            AnalyticsKind::Trend { shop, days } => {
                analytics::trend(&pool, &shop, days).await
            }
            AnalyticsKind::ShareOfVoice { shop, days } => {
                analytics::share_of_voice(&pool, &shop, days).await
            }
            AnalyticsKind::Positions { shop, days } => {
                analytics::positions(&pool, &shop, days).await
            }
        },
        Commands::Shops => shops::list(&pool).await,
    }
}

/// Load a shop by slug and resolve its plan, with CLI-friendly errors.
async fn load_shop_and_plan(
    pool: &PgPool,
    plans: &PlanCatalog,
    slug: &str,
) -> anyhow::Result<(ShopRow, Plan)> {
    let shop = aivis_db::get_shop_by_slug(pool, slug)
        .await
        .with_context(|| format!("shop '{slug}' not found"))?;
    let plan = plans
        .get(&shop.plan_id)
        .cloned()
        .with_context(|| format!("shop '{slug}' references unknown plan '{}'", shop.plan_id))?;
    Ok((shop, plan))
}

mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use aivis_audit::CatalogClient;
use aivis_visibility::{ChatCompletionClient, PlatformSet};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(aivis_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let plans = Arc::new(aivis_core::load_plans(&config.plans_path)?);
    let platforms = Arc::new(PlatformSet::from_env());
    if platforms.is_empty() {
        tracing::warn!("no platform API keys configured; visibility runs will probe nothing");
    }

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;
    aivis_db::run_migrations(&pool).await?;

    let catalog_client = CatalogClient::new(
        config.catalog_request_timeout_secs,
        &config.catalog_user_agent,
        config.catalog_max_retries,
        config.catalog_retry_backoff_base_secs,
    )?;
    let chat_client = ChatCompletionClient::new(config.platform_request_timeout_secs)?;

    let _scheduler = scheduler::build_scheduler(scheduler::SchedulerContext {
        pool: pool.clone(),
        config: Arc::clone(&config),
        plans: Arc::clone(&plans),
        platforms: Arc::clone(&platforms),
        catalog_client: catalog_client.clone(),
        chat_client: chat_client.clone(),
    })
    .await?;

    let auth = AuthState::from_env(config.env.is_development())?;
    let bind_addr = config.bind_addr;
    let state = AppState {
        pool,
        config,
        plans,
        platforms,
        catalog_client,
        chat_client,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "aivis-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

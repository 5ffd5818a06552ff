use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Whether this process runs with development affordances (relaxed auth,
    /// demo shops). Injected as a capability rather than checked ad hoc.
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub plans_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub catalog_request_timeout_secs: u64,
    pub catalog_user_agent: String,
    pub catalog_page_size: u32,
    pub catalog_inter_page_delay_ms: u64,
    pub catalog_max_retries: u32,
    pub catalog_retry_backoff_base_secs: u64,
    pub platform_request_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("plans_path", &self.plans_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "catalog_request_timeout_secs",
                &self.catalog_request_timeout_secs,
            )
            .field("catalog_user_agent", &self.catalog_user_agent)
            .field("catalog_page_size", &self.catalog_page_size)
            .field(
                "catalog_inter_page_delay_ms",
                &self.catalog_inter_page_delay_ms,
            )
            .field("catalog_max_retries", &self.catalog_max_retries)
            .field(
                "catalog_retry_backoff_base_secs",
                &self.catalog_retry_backoff_base_secs,
            )
            .field(
                "platform_request_timeout_secs",
                &self.platform_request_timeout_secs,
            )
            .finish()
    }
}

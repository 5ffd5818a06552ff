use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod plans;
pub mod products;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use plans::{load_plans, Plan, PlanCatalog};
pub use products::{Metafield, Product, ProductImage};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read plans file {path}: {source}")]
    PlansFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plans file: {0}")]
    PlansFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

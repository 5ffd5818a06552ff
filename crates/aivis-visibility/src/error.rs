use thiserror::Error;

use crate::platform::PlatformId;

/// Failure of a single platform call. Never fatal to a run: the
/// orchestrator skips the platform and reports it in the run's failure
/// list.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform {platform} unavailable: {reason}")]
    Unavailable {
        platform: PlatformId,
        reason: String,
    },

    #[error("HTTP client construction failed: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Persistence-seam failure reported by a [`crate::CheckStore`] implementation.
#[derive(Debug, Error)]
#[error("check store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, Error)]
pub enum VisibilityError {
    /// The run would push the shop past its monthly check quota. Rejected
    /// before any platform is queried; zero rows are written.
    #[error("monthly visibility quota exceeded: {used}/{limit} checks used, {requested} more requested")]
    QuotaExceeded {
        used: u64,
        limit: u64,
        requested: u64,
    },

    /// Malformed caller input, rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

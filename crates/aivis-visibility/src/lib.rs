//! Visibility probing engine: fans a query set out to AI chat platforms,
//! parses each free-text response for brand mentions, and records
//! append-only check history under plan-tiered monthly quotas.

mod adapter;
mod analyzer;
mod error;
mod orchestrator;
mod platform;
mod queries;
mod store;

pub use adapter::{ChatCompletionClient, PlatformReply};
pub use analyzer::{analyze, Analysis, ResponseQuality};
pub use error::{PlatformError, StoreError, VisibilityError};
pub use orchestrator::{run_visibility_check, PlatformFailure, VisibilityRun, VisibilityTarget};
pub use platform::{PlatformConfig, PlatformId, PlatformSet};
pub use queries::{default_queries, validate_queries, MAX_QUERIES_PER_RUN, MAX_QUERY_CHARS};
pub use store::{CheckStore, VisibilityCheck};

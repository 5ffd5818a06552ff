//! Check persistence seam and the append-only record written through it.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::ResponseQuality;
use crate::error::StoreError;
use crate::platform::PlatformId;

/// One probe of one platform with one query. Immutable once created:
/// history is append-only, which is what makes trend analysis over stored
/// checks valid. Rows are never deduplicated — two checks in the same
/// instant are two rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityCheck {
    pub shop_id: i64,
    pub platform: PlatformId,
    pub query: String,
    pub is_mentioned: bool,
    pub mention_context: Option<String>,
    /// 1-based rank among list entries; `None` for unranked mentions.
    pub position: Option<u32>,
    pub competitors_found: Vec<String>,
    pub response_quality: ResponseQuality,
    /// Platform round-trip time.
    pub duration_ms: u64,
    pub checked_at: DateTime<Utc>,
}

/// Persistence operations the visibility orchestrator needs.
pub trait CheckStore {
    /// Append one check row. Never an upsert.
    fn insert_check(
        &self,
        check: &VisibilityCheck,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Number of checks recorded for the shop at or after `since`. Used
    /// for quota counting over the current calendar month.
    fn count_checks_since(
        &self,
        shop_id: i64,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

//! Audit persistence seam and the records written through it.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::summary::AuditSummary;

/// Issue severity, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// One content-quality finding on a product.
///
/// `code` is stable across runs so issues can be compared over time;
/// `message` is display text and may be reworded freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

/// Audit result for one product in one shop. Overwritten on every run via
/// an upsert keyed by `(shop_id, product_id)`, which makes audit runs
/// idempotent over an unchanged catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAudit {
    pub shop_id: i64,
    pub product_id: i64,
    pub title: String,
    pub handle: String,
    /// Deterministic content-quality score in `[0, 100]`.
    pub ai_score: u8,
    pub issues: Vec<Issue>,
    pub has_images: bool,
    pub has_description: bool,
    pub has_metafields: bool,
    /// Visible (tag-stripped) description length in characters.
    pub description_length: u32,
    pub last_audit_at: DateTime<Utc>,
}

/// Persistence operations the audit engine needs.
///
/// Backed by Postgres in production; tests use in-memory fakes.
pub trait AuditStore {
    /// Insert or overwrite the audit row keyed by `(shop_id, product_id)`.
    fn upsert_audit(
        &self,
        audit: &ProductAudit,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All audit rows currently stored for a shop, in product-id order.
    fn list_audits(
        &self,
        shop_id: i64,
    ) -> impl Future<Output = Result<Vec<ProductAudit>, StoreError>> + Send;

    /// Overwrite the cached shop summary. The cache is derived state; it is
    /// rewritten wholesale on every audit run, never patched.
    fn save_summary(
        &self,
        shop_id: i64,
        summary: &AuditSummary,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

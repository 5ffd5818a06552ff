//! Database operations for `product_audits` and the `audit_summaries` cache.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aivis_audit::{AuditStore, AuditSummary, ProductAudit, StoreError};

use crate::DbError;

/// A row from the `product_audits` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductAuditRow {
    pub id: i64,
    pub shop_id: i64,
    pub product_id: i64,
    pub title: String,
    pub handle: String,
    pub ai_score: i16,
    pub issues: serde_json::Value,
    pub has_images: bool,
    pub has_description: bool,
    pub has_metafields: bool,
    pub description_length: i32,
    pub last_audit_at: DateTime<Utc>,
}

impl ProductAuditRow {
    fn into_domain(self) -> Result<ProductAudit, DbError> {
        Ok(ProductAudit {
            shop_id: self.shop_id,
            product_id: self.product_id,
            title: self.title,
            handle: self.handle,
            ai_score: u8::try_from(self.ai_score)
                .map_err(|_| DbError::Decode(format!("ai_score out of range: {}", self.ai_score)))?,
            issues: serde_json::from_value(self.issues)
                .map_err(|e| DbError::Decode(format!("issues JSON: {e}")))?,
            has_images: self.has_images,
            has_description: self.has_description,
            has_metafields: self.has_metafields,
            description_length: u32::try_from(self.description_length).unwrap_or(0),
            last_audit_at: self.last_audit_at,
        })
    }
}

/// Insert or overwrite the audit row keyed by `(shop_id, product_id)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product_audit(pool: &PgPool, audit: &ProductAudit) -> Result<(), DbError> {
    let issues = serde_json::to_value(&audit.issues)
        .map_err(|e| DbError::Decode(format!("issues JSON: {e}")))?;

    sqlx::query(
        "INSERT INTO product_audits \
             (shop_id, product_id, title, handle, ai_score, issues, has_images, \
              has_description, has_metafields, description_length, last_audit_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (shop_id, product_id) DO UPDATE SET \
             title = EXCLUDED.title, \
             handle = EXCLUDED.handle, \
             ai_score = EXCLUDED.ai_score, \
             issues = EXCLUDED.issues, \
             has_images = EXCLUDED.has_images, \
             has_description = EXCLUDED.has_description, \
             has_metafields = EXCLUDED.has_metafields, \
             description_length = EXCLUDED.description_length, \
             last_audit_at = EXCLUDED.last_audit_at",
    )
    .bind(audit.shop_id)
    .bind(audit.product_id)
    .bind(&audit.title)
    .bind(&audit.handle)
    .bind(i16::from(audit.ai_score))
    .bind(issues)
    .bind(audit.has_images)
    .bind(audit.has_description)
    .bind(audit.has_metafields)
    .bind(i32::try_from(audit.description_length).unwrap_or(i32::MAX))
    .bind(audit.last_audit_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All audit rows for a shop, in product-id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Decode`] if
/// a stored row cannot be converted back to the domain type.
pub async fn list_product_audits(pool: &PgPool, shop_id: i64) -> Result<Vec<ProductAudit>, DbError> {
    let rows = sqlx::query_as::<_, ProductAuditRow>(
        "SELECT id, shop_id, product_id, title, handle, ai_score, issues, has_images, \
                has_description, has_metafields, description_length, last_audit_at \
         FROM product_audits \
         WHERE shop_id = $1 \
         ORDER BY product_id",
    )
    .bind(shop_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ProductAuditRow::into_domain).collect()
}

/// Overwrite the cached summary for a shop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn save_audit_summary(
    pool: &PgPool,
    shop_id: i64,
    summary: &AuditSummary,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO audit_summaries \
             (shop_id, total_products, audited_products, average_score, \
              critical_issues, warning_issues, info_issues, \
              critical_products, warning_products, info_products, healthy_products, \
              last_audit_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW()) \
         ON CONFLICT (shop_id) DO UPDATE SET \
             total_products = EXCLUDED.total_products, \
             audited_products = EXCLUDED.audited_products, \
             average_score = EXCLUDED.average_score, \
             critical_issues = EXCLUDED.critical_issues, \
             warning_issues = EXCLUDED.warning_issues, \
             info_issues = EXCLUDED.info_issues, \
             critical_products = EXCLUDED.critical_products, \
             warning_products = EXCLUDED.warning_products, \
             info_products = EXCLUDED.info_products, \
             healthy_products = EXCLUDED.healthy_products, \
             last_audit_at = EXCLUDED.last_audit_at, \
             updated_at = NOW()",
    )
    .bind(shop_id)
    .bind(to_i64(summary.total_products))
    .bind(to_i64(summary.audited_products))
    .bind(summary.average_score)
    .bind(to_i64(summary.critical_issues))
    .bind(to_i64(summary.warning_issues))
    .bind(to_i64(summary.info_issues))
    .bind(to_i64(summary.critical_products))
    .bind(to_i64(summary.warning_products))
    .bind(to_i64(summary.info_products))
    .bind(to_i64(summary.healthy_products))
    .bind(summary.last_audit_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read the cached summary for a shop, if one has been computed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_audit_summary(
    pool: &PgPool,
    shop_id: i64,
) -> Result<Option<AuditSummary>, DbError> {
    #[derive(sqlx::FromRow)]
    struct SummaryRow {
        total_products: i64,
        audited_products: i64,
        average_score: f64,
        critical_issues: i64,
        warning_issues: i64,
        info_issues: i64,
        critical_products: i64,
        warning_products: i64,
        info_products: i64,
        healthy_products: i64,
        last_audit_at: Option<DateTime<Utc>>,
    }

    let row = sqlx::query_as::<_, SummaryRow>(
        "SELECT total_products, audited_products, average_score, \
                critical_issues, warning_issues, info_issues, \
                critical_products, warning_products, info_products, healthy_products, \
                last_audit_at \
         FROM audit_summaries \
         WHERE shop_id = $1",
    )
    .bind(shop_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| AuditSummary {
        total_products: to_u64(r.total_products),
        audited_products: to_u64(r.audited_products),
        average_score: r.average_score,
        critical_issues: to_u64(r.critical_issues),
        warning_issues: to_u64(r.warning_issues),
        info_issues: to_u64(r.info_issues),
        critical_products: to_u64(r.critical_products),
        warning_products: to_u64(r.warning_products),
        info_products: to_u64(r.info_products),
        healthy_products: to_u64(r.healthy_products),
        last_audit_at: r.last_audit_at,
    }))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Postgres-backed [`AuditStore`] handed to the audit engine.
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditStore for PgAuditStore {
    async fn upsert_audit(&self, audit: &ProductAudit) -> Result<(), StoreError> {
        upsert_product_audit(&self.pool, audit)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn list_audits(&self, shop_id: i64) -> Result<Vec<ProductAudit>, StoreError> {
        list_product_audits(&self.pool, shop_id)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn save_summary(&self, shop_id: i64, summary: &AuditSummary) -> Result<(), StoreError> {
        save_audit_summary(&self.pool, shop_id, summary)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }
}

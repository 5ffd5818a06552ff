//! Database operations for the append-only `visibility_checks` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aivis_visibility::{CheckStore, PlatformId, ResponseQuality, StoreError, VisibilityCheck};

use crate::DbError;

/// A row from the `visibility_checks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisibilityCheckRow {
    pub id: i64,
    pub shop_id: i64,
    pub platform: String,
    pub query: String,
    pub is_mentioned: bool,
    pub mention_context: Option<String>,
    pub list_position: Option<i32>,
    pub competitors_found: Vec<String>,
    pub response_quality: String,
    pub duration_ms: i64,
    pub checked_at: DateTime<Utc>,
}

impl VisibilityCheckRow {
    fn into_domain(self) -> Result<VisibilityCheck, DbError> {
        let platform = PlatformId::parse(&self.platform)
            .ok_or_else(|| DbError::Decode(format!("unknown platform: {}", self.platform)))?;
        let response_quality = parse_quality(&self.response_quality)
            .ok_or_else(|| DbError::Decode(format!("unknown quality: {}", self.response_quality)))?;

        Ok(VisibilityCheck {
            shop_id: self.shop_id,
            platform,
            query: self.query,
            is_mentioned: self.is_mentioned,
            mention_context: self.mention_context,
            position: self.list_position.and_then(|p| u32::try_from(p).ok()),
            competitors_found: self.competitors_found,
            response_quality,
            duration_ms: u64::try_from(self.duration_ms).unwrap_or(0),
            checked_at: self.checked_at,
        })
    }
}

fn quality_str(quality: ResponseQuality) -> &'static str {
    match quality {
        ResponseQuality::Detailed => "detailed",
        ResponseQuality::Brief => "brief",
        ResponseQuality::None => "none",
    }
}

fn parse_quality(s: &str) -> Option<ResponseQuality> {
    match s {
        "detailed" => Some(ResponseQuality::Detailed),
        "brief" => Some(ResponseQuality::Brief),
        "none" => Some(ResponseQuality::None),
        _ => None,
    }
}

/// Append one check row. Never an update: history is immutable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_visibility_check(pool: &PgPool, check: &VisibilityCheck) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO visibility_checks \
             (shop_id, platform, query, is_mentioned, mention_context, list_position, \
              competitors_found, response_quality, duration_ms, checked_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id",
    )
    .bind(check.shop_id)
    .bind(check.platform.as_str())
    .bind(&check.query)
    .bind(check.is_mentioned)
    .bind(&check.mention_context)
    .bind(check.position.and_then(|p| i32::try_from(p).ok()))
    .bind(&check.competitors_found)
    .bind(quality_str(check.response_quality))
    .bind(i64::try_from(check.duration_ms).unwrap_or(i64::MAX))
    .bind(check.checked_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Check history for a shop, newest first, optionally bounded to a window
/// start. `limit` caps the row count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Decode`] if
/// a stored row cannot be converted back to the domain type.
pub async fn list_visibility_checks(
    pool: &PgPool,
    shop_id: i64,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<VisibilityCheck>, DbError> {
    const COLUMNS: &str = "id, shop_id, platform, query, is_mentioned, mention_context, \
         list_position, competitors_found, response_quality, duration_ms, checked_at";

    let rows = match since {
        Some(since) => {
            sqlx::query_as::<_, VisibilityCheckRow>(&format!(
                "SELECT {COLUMNS} FROM visibility_checks \
                 WHERE shop_id = $1 AND checked_at >= $2 \
                 ORDER BY checked_at DESC, id DESC \
                 LIMIT $3"
            ))
            .bind(shop_id)
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, VisibilityCheckRow>(&format!(
                "SELECT {COLUMNS} FROM visibility_checks \
                 WHERE shop_id = $1 \
                 ORDER BY checked_at DESC, id DESC \
                 LIMIT $2"
            ))
            .bind(shop_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter().map(VisibilityCheckRow::into_domain).collect()
}

/// Number of checks for a shop at or after `since`. This is the quota
/// read: quota is always counted from rows, never from a stored counter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_visibility_checks_since(
    pool: &PgPool,
    shop_id: i64,
    since: DateTime<Utc>,
) -> Result<u64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM visibility_checks WHERE shop_id = $1 AND checked_at >= $2",
    )
    .bind(shop_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Postgres-backed [`CheckStore`] handed to the visibility orchestrator.
#[derive(Clone)]
pub struct PgCheckStore {
    pool: PgPool,
}

impl PgCheckStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CheckStore for PgCheckStore {
    async fn insert_check(&self, check: &VisibilityCheck) -> Result<(), StoreError> {
        insert_visibility_check(&self.pool, check)
            .await
            .map(|_| ())
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn count_checks_since(
        &self,
        shop_id: i64,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        count_visibility_checks_since(&self.pool, shop_id, since)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }
}

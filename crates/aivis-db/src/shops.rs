//! Database operations for the `shops` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `shops` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub brand_name: String,
    pub domain: Option<String>,
    pub vertical: String,
    pub catalog_url: String,
    pub plan_id: String,
    pub competitors: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a shop.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub slug: String,
    pub name: String,
    pub brand_name: String,
    pub domain: Option<String>,
    pub vertical: String,
    pub catalog_url: String,
    pub plan_id: String,
    pub competitors: Vec<String>,
}

const SHOP_COLUMNS: &str = "id, slug, name, brand_name, domain, vertical, catalog_url, \
     plan_id, competitors, is_active, created_at";

/// Insert a shop and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including slug conflicts).
pub async fn create_shop(pool: &PgPool, shop: &NewShop) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO shops (slug, name, brand_name, domain, vertical, catalog_url, plan_id, competitors) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(&shop.slug)
    .bind(&shop.name)
    .bind(&shop.brand_name)
    .bind(&shop.domain)
    .bind(&shop.vertical)
    .bind(&shop.catalog_url)
    .bind(&shop.plan_id)
    .bind(&shop.competitors)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Fetch one shop by slug.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no such shop exists, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_shop_by_slug(pool: &PgPool, slug: &str) -> Result<ShopRow, DbError> {
    let row = sqlx::query_as::<_, ShopRow>(&format!(
        "SELECT {SHOP_COLUMNS} FROM shops WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// All active shops, ordered by slug. Used by the scheduler to drive
/// recurring audits and visibility runs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_shops(pool: &PgPool) -> Result<Vec<ShopRow>, DbError> {
    let rows = sqlx::query_as::<_, ShopRow>(&format!(
        "SELECT {SHOP_COLUMNS} FROM shops WHERE is_active = TRUE ORDER BY slug"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

//! Wire types for the catalog source's paged products endpoint.
//!
//! ## Paging contract
//!
//! `GET <catalog_url>/products.json?limit=N[&cursor=C]` returns one page:
//!
//! ```json
//! {
//!   "products": [ ... ],
//!   "page_info": { "next_cursor": "eyJsYXN0X2lkIjo2fQ", "total_count": 150 }
//! }
//! ```
//!
//! `next_cursor` is `null` (or the whole `page_info` object absent) on the
//! last page. `total_count` is the catalog-wide product count when the
//! source reports it; sources that cannot count cheaply omit it, in which
//! case plan-cap reporting falls back to what was actually fetched.

use serde::Deserialize;

use aivis_core::Product;

/// Top-level response for one catalog page.
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<Product>,

    /// Paging metadata; absent on single-page catalogs.
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

/// Cursor and count metadata attached to a page.
#[derive(Debug, Deserialize)]
pub struct PageInfo {
    /// Opaque cursor for the next page, `null` on the last page.
    #[serde(default)]
    pub next_cursor: Option<String>,

    /// Catalog-wide product count, when the source reports one.
    #[serde(default)]
    pub total_count: Option<u64>,
}

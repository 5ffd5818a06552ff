//! Catalog-source seam consumed by the audit engine.

use std::future::Future;

use aivis_core::Product;

use crate::error::CatalogError;

/// One fetched catalog page, already converted from the wire shape.
#[derive(Debug)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    /// Opaque cursor for the next page; `None` when the catalog is exhausted.
    pub next_cursor: Option<String>,
    /// Catalog-wide product count when the source reports one.
    pub total_count: Option<u64>,
}

/// Cursor-paged read access to one shop's product catalog.
///
/// The engine drives the paging loop sequentially (each cursor comes from
/// the previous page), so implementations only fetch single pages.
pub trait CatalogSource {
    fn fetch_page(
        &self,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;
}

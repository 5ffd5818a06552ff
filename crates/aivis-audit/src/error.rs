use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("catalog endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid catalog URL \"{url}\": {reason}")]
    InvalidCatalogUrl { url: String, reason: String },
}

/// Persistence-seam failure reported by an [`crate::AuditStore`] implementation.
#[derive(Debug, Error)]
#[error("audit store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, Error)]
pub enum AuditError {
    /// Catalog fetch failed; the run is aborted and safe to retry whole.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),

    /// Guard against cycling cursors from a misbehaving catalog source.
    #[error("pagination limit reached for shop {shop_id}: exceeded {max_pages} pages")]
    PaginationLimit { shop_id: i64, max_pages: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

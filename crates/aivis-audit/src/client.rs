//! HTTP client for the catalog source's paged products endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::error::CatalogError;
use crate::retry::with_backoff;
use crate::source::{CatalogPage, CatalogSource};
use crate::types::ProductsPage;

/// HTTP client for a storefront catalog's `products.json` endpoint.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx
/// responses as typed errors. Transient errors (429, network failures) are
/// retried with exponential backoff up to `max_retries` additional attempts;
/// everything else is propagated immediately so the audit run can abort.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    /// Additional attempts after the first failure for transient errors.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    backoff_base_secs: u64,
}

impl CatalogClient {
    /// Creates a `CatalogClient` with configured timeout, `User-Agent`, and
    /// retry policy. Set `max_retries` to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches one page of products, with automatic retry on transient errors.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`CatalogError::NotFound`] — HTTP 404 (not retried).
    /// - [`CatalogError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`CatalogError::Http`] — network or TLS failure after all retries.
    /// - [`CatalogError::Deserialize`] — body is not a valid products page.
    pub async fn fetch_products_page(
        &self,
        catalog_url: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ProductsPage, CatalogError> {
        let url = Self::products_url(catalog_url, limit, cursor)?;

        with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let catalog_url = catalog_url.to_owned();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);

                    return Err(CatalogError::RateLimited {
                        domain: extract_domain(&catalog_url),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(CatalogError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(CatalogError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<ProductsPage>(&body).map_err(|e| {
                    CatalogError::Deserialize {
                        context: format!("products page from {catalog_url}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// Builds the products URL for the given catalog base, page size, and
    /// optional cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidCatalogUrl`] if the base cannot be
    /// parsed as a URL.
    fn products_url(
        catalog_url: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<String, CatalogError> {
        let base = format!("{}/products.json", catalog_url.trim_end_matches('/'));
        let mut url = reqwest::Url::parse(&base).map_err(|e| CatalogError::InvalidCatalogUrl {
            url: catalog_url.to_owned(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        if let Some(cursor) = cursor {
            url.query_pairs_mut().append_pair("cursor", cursor);
        }

        Ok(url.to_string())
    }
}

/// Extracts the host portion of a catalog URL for error reporting,
/// falling back to the raw string when it does not parse.
fn extract_domain(catalog_url: &str) -> String {
    reqwest::Url::parse(catalog_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| catalog_url.to_owned())
}

/// One shop's catalog endpoint bound to a client and page size.
///
/// This is the production [`CatalogSource`]: the audit engine drives the
/// cursor loop, this type fetches and converts individual pages.
#[derive(Clone)]
pub struct ShopCatalog {
    client: CatalogClient,
    catalog_url: String,
    page_size: u32,
}

impl ShopCatalog {
    #[must_use]
    pub fn new(client: CatalogClient, catalog_url: impl Into<String>, page_size: u32) -> Self {
        Self {
            client,
            catalog_url: catalog_url.into(),
            page_size,
        }
    }
}

impl CatalogSource for ShopCatalog {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage, CatalogError> {
        let page = self
            .client
            .fetch_products_page(&self.catalog_url, self.page_size, cursor)
            .await?;

        let (next_cursor, total_count) = page
            .page_info
            .map(|info| (info.next_cursor, info.total_count))
            .unwrap_or((None, None));

        Ok(CatalogPage {
            products: page.products,
            next_cursor,
            total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_url_without_cursor() {
        let url = CatalogClient::products_url("https://shop.example.com", 250, None)
            .expect("valid url");
        assert_eq!(url, "https://shop.example.com/products.json?limit=250");
    }

    #[test]
    fn products_url_with_cursor() {
        let url = CatalogClient::products_url("https://shop.example.com/", 100, Some("abc123"))
            .expect("valid url");
        assert_eq!(
            url,
            "https://shop.example.com/products.json?limit=100&cursor=abc123"
        );
    }

    #[test]
    fn products_url_rejects_garbage_base() {
        let result = CatalogClient::products_url("not a url", 250, None);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidCatalogUrl { .. })
        ));
    }

    #[test]
    fn extract_domain_parses_host() {
        assert_eq!(
            extract_domain("https://shop.example.com/some/path"),
            "shop.example.com"
        );
    }

    #[test]
    fn extract_domain_falls_back_to_raw_string() {
        assert_eq!(extract_domain("not a url"), "not a url");
    }
}

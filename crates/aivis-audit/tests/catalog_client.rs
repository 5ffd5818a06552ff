//! Integration tests for `CatalogClient` / `ShopCatalog` against a local
//! wiremock server — no real network traffic. Covers the happy paths
//! (empty, single-page, multi-page cursor flow) and every typed error the
//! client can produce.

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aivis_audit::{CatalogClient, CatalogError, CatalogSource, ShopCatalog};

/// Client suitable for tests: 5-second timeout, no retries.
fn test_client() -> CatalogClient {
    CatalogClient::new(5, "aivis-test/0.1", 0, 0).expect("failed to build test CatalogClient")
}

fn test_client_with_retries(max_retries: u32) -> CatalogClient {
    CatalogClient::new(5, "aivis-test/0.1", max_retries, 0)
        .expect("failed to build test CatalogClient")
}

/// Minimal valid one-product page fixture.
fn one_product_page(id: i64, next_cursor: Option<&str>, total: u64) -> serde_json::Value {
    json!({
        "products": [{
            "id": id,
            "title": format!("Product {id}"),
            "handle": format!("product-{id}"),
            "body_html": "<p>Fine product.</p>",
            "tags": ["outdoor"],
            "images": []
        }],
        "page_info": { "next_cursor": next_cursor, "total_count": total }
    })
}

#[tokio::test]
async fn fetch_page_returns_empty_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"products": []})))
        .mount(&server)
        .await;

    let catalog = ShopCatalog::new(test_client(), server.uri(), 250);
    let page = catalog.fetch_page(None).await.expect("page fetch");

    assert!(page.products.is_empty());
    assert!(page.next_cursor.is_none());
    assert!(page.total_count.is_none());
}

#[tokio::test]
async fn fetch_page_parses_products_and_paging_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&one_product_page(1, Some("cursor2"), 12)),
        )
        .mount(&server)
        .await;

    let catalog = ShopCatalog::new(test_client(), server.uri(), 250);
    let page = catalog.fetch_page(None).await.expect("page fetch");

    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products[0].id, 1);
    assert_eq!(page.next_cursor.as_deref(), Some("cursor2"));
    assert_eq!(page.total_count, Some(12));
}

#[tokio::test]
async fn cursor_flows_through_to_the_next_request() {
    let server = MockServer::start().await;

    // First page: no cursor param.
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param_is_missing("cursor"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&one_product_page(1, Some("cursor2"), 2)),
        )
        .mount(&server)
        .await;

    // Second page: requested with the cursor from page one, last page.
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("cursor", "cursor2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_product_page(2, None, 2)))
        .mount(&server)
        .await;

    let catalog = ShopCatalog::new(test_client(), server.uri(), 250);

    let first = catalog.fetch_page(None).await.expect("first page");
    let second = catalog
        .fetch_page(first.next_cursor.as_deref())
        .await
        .expect("second page");

    assert_eq!(first.products[0].id, 1);
    assert_eq!(second.products[0].id, 2);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn page_size_is_sent_as_limit_param() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("limit", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"products": []})))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = ShopCatalog::new(test_client(), server.uri(), 42);
    catalog.fetch_page(None).await.expect("page fetch");
}

#[tokio::test]
async fn not_found_is_typed_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_retries(3);
    let result = client.fetch_products_page(&server.uri(), 250, None).await;

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
}

#[tokio::test]
async fn rate_limit_is_retried_then_surfaces_after_exhaustion() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(3) // initial attempt + 2 retries
        .mount(&server)
        .await;

    let client = test_client_with_retries(2);
    let result = client.fetch_products_page(&server.uri(), 250, None).await;

    match result {
        Err(CatalogError::RateLimited {
            retry_after_secs, ..
        }) => assert_eq!(retry_after_secs, 7),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client();
    let result = client.fetch_products_page(&server.uri(), 250, None).await;

    assert!(
        matches!(result, Err(CatalogError::UnexpectedStatus { status, .. }) if status == 500),
        "expected UnexpectedStatus(500)"
    );
}

#[tokio::test]
async fn malformed_body_maps_to_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client();
    let result = client.fetch_products_page(&server.uri(), 250, None).await;

    assert!(matches!(result, Err(CatalogError::Deserialize { .. })));
}

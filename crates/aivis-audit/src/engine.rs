//! Audit run orchestration: page through the catalog, score, upsert,
//! recompute the shop summary.

use std::time::Duration;

use chrono::Utc;

use aivis_core::{Plan, Product};

use crate::error::AuditError;
use crate::rules::{score_product, ProductScore};
use crate::source::CatalogSource;
use crate::store::{AuditStore, ProductAudit};
use crate::summary::{summarize, AuditSummary};

/// Maximum number of catalog pages fetched per run. Prevents infinite
/// loops on cycling cursors from a misbehaving source.
pub const MAX_PAGES: usize = 200;

/// Plan-cap reporting attached to every audit outcome.
///
/// The engine never silently drops catalog tail beyond the cap; callers get
/// the drop count so upgrade prompts can be rendered.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlanInfo {
    pub plan_id: String,
    pub product_cap: u32,
    /// Products beyond the plan cap that were not audited. `0` when the
    /// source reports no catalog-wide total (the remainder is unknowable
    /// without fetching pages the cap exists to avoid).
    pub products_not_analyzed: u64,
}

/// Result of one audit run.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub summary: AuditSummary,
    pub plan_info: PlanInfo,
}

/// Run a full catalog audit for one shop.
///
/// Fetches pages sequentially until the catalog is exhausted or the plan's
/// product cap is reached, whichever comes first; scores each product and
/// upserts its audit row keyed by `(shop_id, product_id)`; then recomputes
/// the shop summary from the complete stored audit set and overwrites the
/// summary cache. Idempotent over an unchanged catalog.
///
/// `inter_page_delay_ms` throttles consecutive page fetches (applied after
/// every page except the first).
///
/// # Errors
///
/// - [`AuditError::CatalogUnavailable`] — a page fetch failed; no summary
///   is committed and the whole run can be retried safely.
/// - [`AuditError::PaginationLimit`] — the source returned more than
///   [`MAX_PAGES`] pages, which indicates a cycling cursor.
/// - [`AuditError::Store`] — a persistence operation failed.
pub async fn run_audit<C, S>(
    shop_id: i64,
    plan: &Plan,
    source: &C,
    store: &S,
    inter_page_delay_ms: u64,
) -> Result<AuditOutcome, AuditError>
where
    C: CatalogSource + Sync,
    S: AuditStore + Sync,
{
    let cap = u64::from(plan.products_audited);
    let mut audited: u64 = 0;
    let mut cursor: Option<String> = None;
    let mut reported_total: Option<u64> = None;
    let mut page_count = 0usize;
    let mut is_first_page = true;

    'pages: loop {
        page_count += 1;
        if page_count > MAX_PAGES {
            return Err(AuditError::PaginationLimit {
                shop_id,
                max_pages: MAX_PAGES,
            });
        }

        if !is_first_page && inter_page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(inter_page_delay_ms)).await;
        }
        is_first_page = false;

        let page = source.fetch_page(cursor.as_deref()).await?;
        if reported_total.is_none() {
            reported_total = page.total_count;
        }

        let now = Utc::now();
        for product in &page.products {
            if audited >= cap {
                break 'pages;
            }
            let scored = score_product(product);
            let audit = build_audit(shop_id, product, scored, now);
            store.upsert_audit(&audit).await?;
            audited += 1;
        }

        cursor = page.next_cursor;
        if cursor.is_none() || audited >= cap {
            break;
        }
    }

    let products_not_analyzed = match reported_total {
        Some(total) => total.saturating_sub(audited),
        None => {
            if audited >= cap {
                tracing::debug!(
                    shop_id,
                    "catalog reported no total count; unaudited remainder unknown"
                );
            }
            0
        }
    };

    let audits = store.list_audits(shop_id).await?;
    let summary = summarize(&audits, reported_total.unwrap_or(audited));
    store.save_summary(shop_id, &summary).await?;

    tracing::info!(
        shop_id,
        audited,
        products_not_analyzed,
        average_score = summary.average_score,
        "audit run complete"
    );

    Ok(AuditOutcome {
        summary,
        plan_info: PlanInfo {
            plan_id: plan.id.clone(),
            product_cap: plan.products_audited,
            products_not_analyzed,
        },
    })
}

fn build_audit(shop_id: i64, product: &Product, scored: ProductScore, now: chrono::DateTime<Utc>) -> ProductAudit {
    ProductAudit {
        shop_id,
        product_id: product.id,
        title: product.title.clone(),
        handle: product.handle.clone(),
        ai_score: scored.ai_score,
        issues: scored.issues,
        has_images: !product.images.is_empty(),
        has_description: scored.description_length > 0,
        has_metafields: !product.metafields.is_empty(),
        description_length: scored.description_length,
        last_audit_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::error::{CatalogError, StoreError};
    use crate::source::CatalogPage;

    use super::*;

    fn product(id: i64) -> Product {
        Product {
            id,
            title: format!("Product {id}"),
            handle: format!("product-{id}"),
            body_html: Some("<p>Short blurb.</p>".to_string()),
            vendor: Some("Summit Co".to_string()),
            product_type: Some("Backpacks".to_string()),
            tags: vec!["hiking".to_string()],
            seo_title: None,
            seo_description: None,
            images: vec![],
            metafields: vec![],
            available: true,
        }
    }

    fn plan(cap: u32) -> Plan {
        Plan {
            id: "starter".to_string(),
            products_audited: cap,
            visibility_checks_per_month: 120,
            platforms_tracked: 2,
            competitors_tracked: 3,
            optimizations_per_month: 10,
            history_days: 30,
        }
    }

    /// Catalog fake: cursor is the page index as a string.
    struct FakeCatalog {
        pages: Vec<Vec<Product>>,
        total: Option<u64>,
        fail: bool,
        cycle: bool,
    }

    impl FakeCatalog {
        fn paged(pages: Vec<Vec<Product>>, total: Option<u64>) -> Self {
            Self {
                pages,
                total,
                fail: false,
                cycle: false,
            }
        }
    }

    impl CatalogSource for FakeCatalog {
        async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage, CatalogError> {
            if self.fail {
                return Err(CatalogError::UnexpectedStatus {
                    status: 503,
                    url: "https://shop.example.com/products.json".to_string(),
                });
            }
            if self.cycle {
                // Always hand back the same cursor — simulates a source bug.
                return Ok(CatalogPage {
                    products: vec![],
                    next_cursor: Some("loop".to_string()),
                    total_count: None,
                });
            }
            let idx = cursor.map_or(0, |c| c.parse::<usize>().expect("numeric test cursor"));
            let products = self.pages.get(idx).cloned().unwrap_or_default();
            let next_cursor = (idx + 1 < self.pages.len()).then(|| (idx + 1).to_string());
            Ok(CatalogPage {
                products,
                next_cursor,
                total_count: self.total,
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        audits: Mutex<BTreeMap<(i64, i64), ProductAudit>>,
        summaries: Mutex<BTreeMap<i64, AuditSummary>>,
    }

    impl AuditStore for MemoryStore {
        async fn upsert_audit(&self, audit: &ProductAudit) -> Result<(), StoreError> {
            self.audits
                .lock()
                .expect("audits lock")
                .insert((audit.shop_id, audit.product_id), audit.clone());
            Ok(())
        }

        async fn list_audits(&self, shop_id: i64) -> Result<Vec<ProductAudit>, StoreError> {
            Ok(self
                .audits
                .lock()
                .expect("audits lock")
                .values()
                .filter(|a| a.shop_id == shop_id)
                .cloned()
                .collect())
        }

        async fn save_summary(
            &self,
            shop_id: i64,
            summary: &AuditSummary,
        ) -> Result<(), StoreError> {
            self.summaries
                .lock()
                .expect("summaries lock")
                .insert(shop_id, summary.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn audits_whole_catalog_under_cap() {
        let source = FakeCatalog::paged(
            vec![vec![product(1), product(2)], vec![product(3)]],
            Some(3),
        );
        let store = MemoryStore::default();

        let outcome = run_audit(7, &plan(100), &source, &store, 0)
            .await
            .expect("audit succeeds");

        assert_eq!(outcome.summary.audited_products, 3);
        assert_eq!(outcome.summary.total_products, 3);
        assert_eq!(outcome.plan_info.products_not_analyzed, 0);
        assert_eq!(store.audits.lock().unwrap().len(), 3);
        assert!(store.summaries.lock().unwrap().contains_key(&7));
    }

    #[tokio::test]
    async fn honors_plan_cap_and_reports_the_drop() {
        // 150 products across 3 pages; cap 100 → first 100 audited.
        let pages: Vec<Vec<Product>> = (0..3)
            .map(|p| (0..50).map(|i| product(p * 50 + i)).collect())
            .collect();
        let source = FakeCatalog::paged(pages, Some(150));
        let store = MemoryStore::default();

        let outcome = run_audit(7, &plan(100), &source, &store, 0)
            .await
            .expect("audit succeeds");

        assert_eq!(outcome.summary.audited_products, 100);
        assert_eq!(outcome.plan_info.products_not_analyzed, 50);
        assert_eq!(outcome.plan_info.product_cap, 100);
        // First 100 in source order, nothing beyond.
        let audits = store.audits.lock().unwrap();
        assert!(audits.contains_key(&(7, 0)));
        assert!(audits.contains_key(&(7, 99)));
        assert!(!audits.contains_key(&(7, 100)));
    }

    #[tokio::test]
    async fn rerun_is_idempotent_over_unchanged_catalog() {
        let source = FakeCatalog::paged(vec![vec![product(1), product(2)]], Some(2));
        let store = MemoryStore::default();

        run_audit(7, &plan(100), &source, &store, 0)
            .await
            .expect("first run");
        let first: Vec<(u8, Vec<crate::store::Issue>)> = store
            .audits
            .lock()
            .unwrap()
            .values()
            .map(|a| (a.ai_score, a.issues.clone()))
            .collect();

        run_audit(7, &plan(100), &source, &store, 0)
            .await
            .expect("second run");
        let second: Vec<(u8, Vec<crate::store::Issue>)> = store
            .audits
            .lock()
            .unwrap()
            .values()
            .map(|a| (a.ai_score, a.issues.clone()))
            .collect();

        assert_eq!(first, second);
        assert_eq!(store.audits.lock().unwrap().len(), 2, "no duplicate rows");
    }

    #[tokio::test]
    async fn catalog_failure_aborts_without_summary() {
        let source = FakeCatalog {
            pages: vec![],
            total: None,
            fail: true,
            cycle: false,
        };
        let store = MemoryStore::default();

        let result = run_audit(7, &plan(100), &source, &store, 0).await;

        assert!(matches!(result, Err(AuditError::CatalogUnavailable(_))));
        assert!(store.audits.lock().unwrap().is_empty());
        assert!(store.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cycling_cursor_hits_pagination_guard() {
        let source = FakeCatalog {
            pages: vec![],
            total: None,
            fail: false,
            cycle: true,
        };
        let store = MemoryStore::default();

        let result = run_audit(7, &plan(100), &source, &store, 0).await;

        assert!(matches!(
            result,
            Err(AuditError::PaginationLimit { max_pages, .. }) if max_pages == MAX_PAGES
        ));
    }

    #[tokio::test]
    async fn unknown_total_reports_zero_not_analyzed() {
        let source = FakeCatalog::paged(vec![vec![product(1), product(2)]], None);
        let store = MemoryStore::default();

        let outcome = run_audit(7, &plan(1), &source, &store, 0)
            .await
            .expect("audit succeeds");

        assert_eq!(outcome.summary.audited_products, 1);
        assert_eq!(outcome.plan_info.products_not_analyzed, 0);
    }
}

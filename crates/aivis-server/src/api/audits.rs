use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use aivis_audit::{AuditError, AuditOutcome, AuditSummary, PlanInfo, ShopCatalog};
use aivis_db::PgAuditStore;

use crate::middleware::RequestId;

use super::{load_shop_and_plan, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct AuditRunData {
    pub summary: AuditSummary,
    pub plan_info: PlanInfo,
}

/// `POST /api/v1/shops/{slug}/audit` — run a full catalog audit now.
pub(super) async fn run_audit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<AuditRunData>>, ApiError> {
    let (shop, plan) = load_shop_and_plan(&state, &slug, &req_id.0).await?;

    let source = ShopCatalog::new(
        state.catalog_client.clone(),
        shop.catalog_url.clone(),
        state.config.catalog_page_size,
    );
    let store = PgAuditStore::new(state.pool.clone());

    let AuditOutcome { summary, plan_info } = aivis_audit::run_audit(
        shop.id,
        &plan,
        &source,
        &store,
        state.config.catalog_inter_page_delay_ms,
    )
    .await
    .map_err(|e| map_audit_error(req_id.0.clone(), &slug, &e))?;

    Ok(Json(ApiResponse {
        data: AuditRunData { summary, plan_info },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/shops/{slug}/audit/summary` — read the cached summary.
pub(super) async fn get_audit_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<AuditSummary>>, ApiError> {
    let (shop, _plan) = load_shop_and_plan(&state, &slug, &req_id.0).await?;

    let summary = aivis_db::get_audit_summary(&state.pool, shop.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                "no audit has completed for this shop yet",
            )
        })?;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_audit_error(request_id: String, slug: &str, error: &AuditError) -> ApiError {
    match error {
        AuditError::CatalogUnavailable(e) => {
            tracing::warn!(shop = slug, error = %e, "audit aborted: catalog unavailable");
            ApiError::new(
                request_id,
                "catalog_unavailable",
                "catalog fetch failed; the audit was aborted and can be retried",
            )
        }
        AuditError::PaginationLimit { .. } => {
            tracing::error!(shop = slug, error = %error, "audit aborted: cursor loop");
            ApiError::new(
                request_id,
                "catalog_unavailable",
                "catalog paging misbehaved; the audit was aborted",
            )
        }
        AuditError::Store(e) => {
            tracing::error!(shop = slug, error = %e, "audit aborted: store failure");
            ApiError::new(request_id, "internal_error", "failed to persist audit results")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_run_data_is_serializable() {
        // Proves the type compiles and serde works — no DB needed.
        let data = AuditRunData {
            summary: aivis_audit::summarize(&[], 0),
            plan_info: PlanInfo {
                plan_id: "starter".to_string(),
                product_cap: 100,
                products_not_analyzed: 0,
            },
        };
        let json = serde_json::to_value(&data).expect("serialize");
        assert_eq!(json["plan_info"]["plan_id"], "starter");
        assert_eq!(json["summary"]["audited_products"], 0);
    }

    #[test]
    fn catalog_failure_maps_to_catalog_unavailable() {
        let err = AuditError::CatalogUnavailable(aivis_audit::CatalogError::NotFound {
            url: "https://shop.example.com/products.json".to_string(),
        });
        let api_err = map_audit_error("req-1".to_string(), "shop", &err);
        assert_eq!(api_err.error.code, "catalog_unavailable");
    }

    #[test]
    fn store_failure_maps_to_internal_error() {
        let err = AuditError::Store(aivis_audit::StoreError("boom".to_string()));
        let api_err = map_audit_error("req-1".to_string(), "shop", &err);
        assert_eq!(api_err.error.code, "internal_error");
    }
}

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use aivis_db::PgCheckStore;
use aivis_visibility::{
    run_visibility_check, PlatformFailure, VisibilityCheck, VisibilityError, VisibilityTarget,
};

use crate::middleware::RequestId;

use super::{
    load_shop_and_plan, map_db_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize, Default)]
pub(super) struct RunChecksBody {
    /// Optional custom queries; replaces the default set when present.
    pub queries: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct VisibilityRunData {
    pub checks: Vec<VisibilityCheck>,
    pub failures: Vec<PlatformFailure>,
}

/// `POST /api/v1/shops/{slug}/visibility/checks` — run a visibility probe
/// across the enabled platforms now.
pub(super) async fn run_visibility_checks(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    body: Option<Json<RunChecksBody>>,
) -> Result<Json<ApiResponse<VisibilityRunData>>, ApiError> {
    let (shop, plan) = load_shop_and_plan(&state, &slug, &req_id.0).await?;
    let queries = body.and_then(|Json(b)| b.queries);

    let store = PgCheckStore::new(state.pool.clone());
    let target = VisibilityTarget {
        shop_id: shop.id,
        brand_name: &shop.brand_name,
        competitors: &shop.competitors,
        vertical: &shop.vertical,
    };

    let run = run_visibility_check(
        target,
        &plan,
        &state.platforms,
        &state.chat_client,
        &store,
        queries,
    )
    .await
    .map_err(|e| map_visibility_error(req_id.0.clone(), &slug, &e))?;

    Ok(Json(ApiResponse {
        data: VisibilityRunData {
            checks: run.checks,
            failures: run.failures,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    /// Window in days; clamped to the plan's history allowance.
    pub days: Option<u32>,
    pub limit: Option<i64>,
}

/// `GET /api/v1/shops/{slug}/visibility/history` — stored checks, newest
/// first.
pub(super) async fn get_visibility_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<VisibilityCheck>>>, ApiError> {
    let (shop, plan) = load_shop_and_plan(&state, &slug, &req_id.0).await?;

    let days = query.days.unwrap_or(plan.history_days).min(plan.history_days);
    let since = Utc::now() - Duration::days(i64::from(days));

    let checks = aivis_db::list_visibility_checks(
        &state.pool,
        shop.id,
        Some(since),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: checks,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_visibility_error(request_id: String, slug: &str, error: &VisibilityError) -> ApiError {
    match error {
        VisibilityError::QuotaExceeded {
            used,
            limit,
            requested,
        } => ApiError::new(
            request_id,
            "quota_exceeded",
            format!(
                "monthly visibility quota would be exceeded: {used}/{limit} used, {requested} requested"
            ),
        ),
        VisibilityError::Validation(msg) => {
            ApiError::new(request_id, "validation_error", msg.clone())
        }
        VisibilityError::Store(e) => {
            tracing::error!(shop = slug, error = %e, "visibility run failed on store access");
            ApiError::new(request_id, "internal_error", "failed to read check history")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aivis_visibility::{PlatformId, ResponseQuality};

    #[test]
    fn run_data_is_serializable() {
        let data = VisibilityRunData {
            checks: vec![VisibilityCheck {
                shop_id: 1,
                platform: PlatformId::ChatGpt,
                query: "best packs?".to_string(),
                is_mentioned: true,
                mention_context: Some("Summit Co is solid.".to_string()),
                position: Some(2),
                competitors_found: vec!["Alpine Ltd".to_string()],
                response_quality: ResponseQuality::Brief,
                duration_ms: 420,
                checked_at: Utc::now(),
            }],
            failures: vec![PlatformFailure {
                platform: PlatformId::Gemini,
                query: "best packs?".to_string(),
                reason: "timed out".to_string(),
            }],
        };
        let json = serde_json::to_value(&data).expect("serialize");
        assert_eq!(json["checks"][0]["platform"], "chatgpt");
        assert_eq!(json["checks"][0]["position"], 2);
        assert_eq!(json["failures"][0]["platform"], "gemini");
    }

    #[test]
    fn quota_error_maps_to_quota_exceeded_code() {
        let err = VisibilityError::QuotaExceeded {
            used: 120,
            limit: 120,
            requested: 8,
        };
        let api_err = map_visibility_error("req-1".to_string(), "shop", &err);
        assert_eq!(api_err.error.code, "quota_exceeded");
        assert!(api_err.error.message.contains("120/120"));
    }

    #[test]
    fn validation_error_keeps_its_message() {
        let err = VisibilityError::Validation("query 1 is blank".to_string());
        let api_err = map_visibility_error("req-1".to_string(), "shop", &err);
        assert_eq!(api_err.error.code, "validation_error");
        assert_eq!(api_err.error.message, "query 1 is blank");
    }
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;

use aivis_db::QuotaReport;

use crate::middleware::RequestId;

use super::{
    load_shop_and_plan, map_db_error, month_start, ApiError, ApiResponse, AppState, ResponseMeta,
};

/// `GET /api/v1/shops/{slug}/quota` — current-period usage against plan
/// limits, computed by counting rows.
pub(super) async fn get_quota(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<QuotaReport>>, ApiError> {
    let (shop, plan) = load_shop_and_plan(&state, &slug, &req_id.0).await?;

    let report = aivis_db::quota_report(&state.pool, &shop, &plan, month_start(Utc::now()))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

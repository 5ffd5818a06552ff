use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{load_shop_and_plan, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Rows loaded per analytics computation. Generous: a max-plan shop doing
/// 4 platforms x 10 queries daily for 90 days stays under it.
const ANALYTICS_ROW_LIMIT: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyticsQuery {
    /// `trend`, `share_of_voice`, or `positions`.
    pub kind: String,
    pub days: Option<u32>,
}

/// `GET /api/v1/shops/{slug}/analytics?kind=...&days=N`.
///
/// Unknown `kind` values are rejected as a validation error before any
/// data is read.
pub(super) async fn get_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !matches!(query.kind.as_str(), "trend" | "share_of_voice" | "positions") {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!(
                "unknown analytics kind '{}'; expected trend, share_of_voice, or positions",
                query.kind
            ),
        ));
    }

    let (shop, plan) = load_shop_and_plan(&state, &slug, &req_id.0).await?;

    let days = query.days.unwrap_or(30).clamp(1, plan.history_days);
    let now = Utc::now();
    let since = now - Duration::days(i64::from(days));

    let checks =
        aivis_db::list_visibility_checks(&state.pool, shop.id, Some(since), ANALYTICS_ROW_LIMIT)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = match query.kind.as_str() {
        "trend" => to_json(&aivis_analytics::trend_data(&checks, days, now)),
        "share_of_voice" => to_json(&aivis_analytics::share_of_voice(
            &checks,
            &shop.competitors,
            days,
            now,
        )),
        _ => to_json(&aivis_analytics::position_history(&checks, days, now)),
    }
    .map_err(|e| {
        tracing::error!(error = %e, "analytics serialization failed");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            "failed to serialize analytics",
        )
    })?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(value)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn trend_payload_shape_matches_api_contract() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let value = to_json(&aivis_analytics::trend_data(&[], 2, now)).expect("serialize");
        let points = value.as_array().expect("array of points");
        assert_eq!(points.len(), 2);
        assert!(points[0]["mention_rate"].is_null(), "empty day is null");
        assert_eq!(points[1]["day"], "2026-08-07");
    }

    #[test]
    fn share_of_voice_payload_flags_no_data() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let sov = aivis_analytics::share_of_voice(&[], &["Nike".to_string()], 30, now);
        let value = to_json(&sov).expect("serialize");
        assert_eq!(value["no_data"], true);
        assert_eq!(value["value"], 0.0);
    }
}

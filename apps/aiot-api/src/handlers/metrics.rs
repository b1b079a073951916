//! Telemetry 指标快照。
//!
//! - GET /api/metrics

use aiot_telemetry::metrics;
use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{AppState, middleware::require_identity};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_identity(&state, &headers).await {
        return response;
    }

    let snapshot = metrics().snapshot();
    let ingest_latency_ms_avg = (snapshot.ingest_latency_ms_count > 0).then(|| {
        snapshot.ingest_latency_ms_total as f64 / snapshot.ingest_latency_ms_count as f64
    });
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            ingest_requests: snapshot.ingest_requests,
            ingest_success: snapshot.ingest_success,
            ingest_failure: snapshot.ingest_failure,
            rejected_invalid: snapshot.rejected_invalid,
            rejected_unauthenticated: snapshot.rejected_unauthenticated,
            ingest_latency_ms_avg,
        })),
    )
        .into_response()
}

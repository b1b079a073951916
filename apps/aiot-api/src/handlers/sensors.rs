//! 传感器读数上报
//!
//! - POST /api/sensors/data
//!
//! 处理顺序：认证 → 请求体校验 → 接入服务（单事务写入用户/设备/读数）。

use aiot_ingest::IngestError;
use aiot_telemetry::record_rejected_invalid;
use api_contract::{ApiResponse, SensorReadingRequest, SensorReadingStoredDto, ValidationIssue};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::utils::response::{auth_error, bad_request_error, internal_error, invalid_payload};
use crate::utils::validation::validate_sensor_request;
use crate::{AppState, middleware::require_identity};

pub async fn store_sensor_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SensorReadingRequest>, JsonRejection>,
) -> Response {
    let identity = match require_identity(&state, &headers).await {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            record_rejected_invalid();
            let status = rejection.status();
            let issue = ValidationIssue::new("body", rejection.body_text());
            warn!(status = status.as_u16(), reason = %issue.message, "sensor_request_rejected");
            if status == StatusCode::PAYLOAD_TOO_LARGE {
                return bad_request_error(status, "payload too large", vec![issue]);
            }
            return invalid_payload(vec![issue]);
        }
    };

    let validated = match validate_sensor_request(request) {
        Ok(validated) => validated,
        Err(issues) => {
            record_rejected_invalid();
            warn!(issues = issues.len(), "sensor_request_invalid");
            return invalid_payload(issues);
        }
    };

    match state
        .ingest
        .record_reading(identity, validated.device, validated.draft)
        .await
    {
        Ok(stored) => {
            info!(
                user_id = stored.user_id,
                device_id = stored.device_id,
                reading_id = stored.reading_id,
                "sensor_reading_accepted"
            );
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(SensorReadingStoredDto {
                    user_id: stored.user_id,
                    device_id: stored.device_id,
                    reading_id: stored.reading_id,
                    message: "sensor reading stored".to_string(),
                })),
            )
                .into_response()
        }
        Err(err) => ingest_error_response(err),
    }
}

/// 接入服务错误到 HTTP 响应的映射。
///
/// 身份主体缺失视为认证失败，其余输入问题按字段回报。
fn ingest_error_response(err: IngestError) -> Response {
    match err {
        IngestError::InvalidInput {
            field: "subjectId", ..
        } => auth_error(StatusCode::UNAUTHORIZED),
        IngestError::InvalidInput { field, message } => {
            invalid_payload(vec![ValidationIssue::new(field, message)])
        }
        IngestError::Storage(_) => internal_error("failed to store reading"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{auth_headers, test_state};
    use http_body_util::BodyExt;
    use serde_json::json;

    fn request(value: serde_json::Value) -> Result<Json<SensorReadingRequest>, JsonRejection> {
        Ok(Json(serde_json::from_value(value).expect("request")))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (state, store) = test_state();
        let response = store_sensor_data(
            State(state),
            HeaderMap::new(),
            request(json!({"deviceId": "d1", "payload": {"temp": 1}})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AUTH.UNAUTHORIZED");
        assert!(store.users().is_empty());
    }

    #[tokio::test]
    async fn invalid_body_lists_issues() {
        let (state, store) = test_state();
        let response = store_sensor_data(
            State(state),
            auth_headers("u1"),
            request(json!({"deviceName": "", "payload": "hot"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");
        assert_eq!(body["error"]["message"], "invalid payload");
        let issues = body["error"]["issues"].as_array().expect("issues");
        assert_eq!(issues.len(), 3);
        assert!(store.users().is_empty());
    }

    #[tokio::test]
    async fn valid_reading_is_stored() {
        let (state, store) = test_state();
        let response = store_sensor_data(
            State(state.clone()),
            auth_headers("u1"),
            request(json!({
                "deviceId": "d1",
                "deviceName": "Sensor A",
                "recordedAt": "2024-05-01T12:00:00Z",
                "payload": {"temp": 21.5}
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["message"], "sensor reading stored");

        let response = store_sensor_data(
            State(state),
            auth_headers("u1"),
            request(json!({"deviceId": "d1", "payload": {"temp": 22.0}})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let users = store.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].subject_id, "u1");
        assert_eq!(users[0].email.as_deref(), Some("u1@example.com"));
        let devices = store.devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name.as_deref(), Some("Sensor A"));
        assert_eq!(store.readings().len(), 2);
    }

    #[tokio::test]
    async fn padded_device_id_is_a_distinct_device() {
        let (state, store) = test_state();
        for device_id in ["d1", " d1 "] {
            let response = store_sensor_data(
                State(state.clone()),
                auth_headers("u1"),
                request(json!({
                    "deviceId": device_id,
                    "recordedAt": "2024-05-01",
                    "payload": {"temp": 1}
                })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let mut external_ids: Vec<String> = store
            .devices()
            .into_iter()
            .map(|device| device.external_id)
            .collect();
        external_ids.sort();
        assert_eq!(external_ids, vec![" d1 ".to_string(), "d1".to_string()]);
        assert!(
            store
                .readings()
                .iter()
                .all(|reading| reading.recorded_at.to_rfc3339() == "2024-05-01T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        let (state, store) = test_state();
        store.set_reading_insert_failure(true);
        let response = store_sensor_data(
            State(state),
            auth_headers("u1"),
            request(json!({"deviceId": "d1", "payload": {"temp": 1}})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL.ERROR");
        assert_eq!(body["error"]["message"], "failed to store reading");
        assert!(store.users().is_empty());
        assert!(store.devices().is_empty());
    }

    #[tokio::test]
    async fn missing_subject_maps_to_unauthorized() {
        let response = ingest_error_response(IngestError::InvalidInput {
            field: "subjectId",
            message: "subject_id required".to_string(),
        });

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AUTH.UNAUTHORIZED");
    }

    #[tokio::test]
    async fn invalid_input_reports_its_own_field() {
        let response = ingest_error_response(IngestError::InvalidInput {
            field: "deviceId",
            message: "device_id required".to_string(),
        });

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["issues"][0]["path"], "deviceId");
        assert_eq!(body["error"]["issues"][0]["message"], "device_id required");
    }
}

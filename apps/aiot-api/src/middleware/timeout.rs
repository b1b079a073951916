//! 超时响应封装
//!
//! TimeoutLayer 超时后返回空响应体的 408，这里改写为统一的 ApiResponse。

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

/// 将 408 响应改写为 REQUEST.TIMEOUT 错误体。
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    warn!("request_timed_out");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(ApiResponse::<()>::error("REQUEST.TIMEOUT", "request timed out")),
    )
        .into_response()
}

//! HTTP 响应辅助函数
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码对应：
//! - 401 AUTH.UNAUTHORIZED
//! - 400 INVALID.REQUEST（带字段级 issues）
//! - 500 INTERNAL.ERROR（细节只写日志）

use aiot_auth::AuthError;
use api_contract::{ApiResponse, ValidationIssue};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(
            "AUTH.UNAUTHORIZED",
            "unauthorized",
        )),
    )
        .into_response()
}

/// 请求体校验失败响应
pub fn invalid_payload(issues: Vec<ValidationIssue>) -> Response {
    bad_request_error(StatusCode::BAD_REQUEST, "invalid payload", issues)
}

/// 错误请求响应
pub fn bad_request_error(
    status: StatusCode,
    message: impl Into<String>,
    issues: Vec<ValidationIssue>,
) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error_with_issues(
            "INVALID.REQUEST",
            message.into(),
            issues,
        )),
    )
        .into_response()
}

/// 认证内部错误响应
pub fn internal_auth_error(err: AuthError) -> Response {
    error!(error = %err, "auth_internal_error");
    internal_error("authentication unavailable")
}

/// 内部错误响应
pub fn internal_error(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message.into())),
    )
        .into_response()
}

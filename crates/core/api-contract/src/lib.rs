//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

/// 单个字段的校验问题。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error_with_issues(code, message, Vec::new())
    }

    /// 带字段级问题列表的失败响应。
    pub fn error_with_issues(
        code: impl Into<String>,
        message: impl Into<String>,
        issues: Vec<ValidationIssue>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
                issues,
            }),
        }
    }
}

/// 上报传感器读数请求体。
///
/// 字段保持宽松类型，由接口层逐项校验后再转换为领域类型。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorReadingRequest {
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    /// 日期时间字符串（RFC 3339 / 无时区 / 仅日期）或毫秒时间戳。
    pub recorded_at: Option<Value>,
    pub payload: Option<Value>,
}

/// 读数写入成功响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadingStoredDto {
    pub user_id: i64,
    pub device_id: i64,
    pub reading_id: i64,
    pub message: String,
}

/// 健康检查响应体。
#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
}

/// 认证健康检查响应体。
#[derive(Debug, Serialize)]
pub struct AuthHealthDto {
    pub status: String,
    pub uid: String,
}

/// 接入指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub ingest_requests: u64,
    pub ingest_success: u64,
    pub ingest_failure: u64,
    pub rejected_invalid: u64,
    pub rejected_unauthenticated: u64,
    pub ingest_latency_ms_avg: Option<f64>,
}

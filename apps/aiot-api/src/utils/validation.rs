//! 输入验证辅助函数
//!
//! - normalize_optional：可选字段，如果提供则去除空格并检查非空
//! - require_identifier：必填标识，只检查非空，原样保留
//! - parse_recorded_at：日期时间字符串或毫秒时间戳
//! - validate_sensor_request：汇总上报请求体的全部问题
//!
//! 失败不立即返回，所有字段问题一并收集到 issues。

use api_contract::{SensorReadingRequest, ValidationIssue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use domain::{DeviceIdentity, ReadingDraft, SensorPayload};
use serde_json::Value;

/// 通过校验的上报请求。
#[derive(Debug)]
pub struct ValidatedReading {
    pub device: DeviceIdentity,
    pub draft: ReadingDraft,
}

/// 验证可选字段，如果提供则去除空格并检查非空
pub fn normalize_optional(
    value: Option<String>,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        issues.push(ValidationIssue::new(
            field,
            format!("{field} must not be empty"),
        ));
        return None;
    }
    Some(trimmed.to_string())
}

/// 验证必填标识，空白视为缺失；通过时原样返回，不去除空格。
pub fn require_identifier(
    value: Option<String>,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match value {
        None => {
            issues.push(ValidationIssue::new(field, format!("{field} required")));
            None
        }
        Some(value) if value.trim().is_empty() => {
            issues.push(ValidationIssue::new(
                field,
                format!("{field} must not be empty"),
            ));
            None
        }
        Some(value) => Some(value),
    }
}

/// 解析 recordedAt；null 视为未提供。
///
/// 字符串支持 RFC 3339、无时区的 `YYYY-MM-DDTHH:MM:SS[.fff]` 与 `YYYY-MM-DD`，
/// 无时区时按 UTC 处理；数字按毫秒时间戳处理，小数部分截断。
pub fn parse_recorded_at(value: &Value) -> Result<Option<DateTime<Utc>>, String> {
    const MESSAGE: &str = "recordedAt must be a date string or epoch milliseconds";
    match value {
        Value::Null => Ok(None),
        Value::String(text) => parse_date_text(text.trim())
            .map(Some)
            .ok_or_else(|| MESSAGE.to_string()),
        Value::Number(number) => {
            let millis = match number.as_i64() {
                Some(millis) => Some(millis),
                None => number
                    .as_f64()
                    .filter(|millis| millis.is_finite())
                    .map(|millis| millis.trunc() as i64),
            };
            millis
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(Some)
                .ok_or_else(|| MESSAGE.to_string())
        }
        _ => Err(MESSAGE.to_string()),
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 校验上报请求体并转换为领域类型
pub fn validate_sensor_request(
    request: SensorReadingRequest,
) -> Result<ValidatedReading, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let device_id = require_identifier(request.device_id, "deviceId", &mut issues);
    let device_name = normalize_optional(request.device_name, "deviceName", &mut issues);
    let recorded_at = match request.recorded_at.as_ref().map(parse_recorded_at) {
        None => None,
        Some(Ok(recorded_at)) => recorded_at,
        Some(Err(message)) => {
            issues.push(ValidationIssue::new("recordedAt", message));
            None
        }
    };
    let payload: Option<SensorPayload> = match request.payload {
        Some(Value::Object(payload)) => Some(payload),
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new("payload", "payload required"));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new("payload", "payload must be an object"));
            None
        }
    };

    match (device_id, payload) {
        (Some(device_id), Some(payload)) if issues.is_empty() => Ok(ValidatedReading {
            device: DeviceIdentity::new(device_id, device_name),
            draft: ReadingDraft {
                recorded_at,
                payload,
            },
        }),
        _ => Err(issues),
    }
}

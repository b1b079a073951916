//! 数据模型
//!
//! - 用户：UserRecord
//! - 设备：DeviceRecord
//! - 读数：SensorReadingRecord
//! - 写入结果：StoredReading
//! - 用户资料更新策略：ProfileUpdatePolicy

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use domain::SensorPayload;

/// 用户记录（外部主体 -> 内部 ID）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// 设备记录，`(user_id, external_id)` 唯一。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: i64,
    pub user_id: i64,
    pub external_id: String,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

/// 读数记录（只追加）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReadingRecord {
    pub id: i64,
    pub device_id: i64,
    pub recorded_at: DateTime<Utc>,
    /// 序列化后的 JSON 文本。
    pub payload: String,
}

/// 一次接入调用解析出的内部 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredReading {
    pub user_id: i64,
    pub device_id: i64,
    pub reading_id: i64,
}

/// 重复出现的主体如何更新 email / display_name。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileUpdatePolicy {
    /// 总是写入本次的值，缺省即写 null。
    #[default]
    Overwrite,
    /// 仅在本次提供了值时更新，否则保留旧值。
    Coalesce,
}

impl ProfileUpdatePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Some(Self::Overwrite),
            "coalesce" => Some(Self::Coalesce),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Coalesce => "coalesce",
        }
    }
}

/// payload 落库前的文本形式（紧凑 JSON）。
pub fn payload_text(payload: &SensorPayload) -> Result<String, StorageError> {
    Ok(serde_json::to_string(payload)?)
}

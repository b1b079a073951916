use crate::{AuthIdentity, non_blank};
use chrono::{DateTime, Utc};

/// 传感器上报内容：任意键值对象，原样落库。
pub type SensorPayload = serde_json::Map<String, serde_json::Value>;

/// 设备标识：调用方提供的外部设备 ID 与可选名称。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// 外部设备 ID，仅在同一用户内唯一。
    pub external_id: String,
    /// 设备名称；None 表示保留已存储的名称。
    pub name: Option<String>,
}

impl DeviceIdentity {
    pub fn new(external_id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            external_id: external_id.into(),
            name: non_blank(name),
        }
    }
}

/// 尚未补齐时间戳的读数（来自请求）。
#[derive(Debug, Clone)]
pub struct ReadingDraft {
    pub recorded_at: Option<DateTime<Utc>>,
    pub payload: SensorPayload,
}

impl ReadingDraft {
    /// 缺省 recorded_at 时使用给定的接入时间。
    pub fn finalize(self, ingested_at: DateTime<Utc>) -> SensorReading {
        SensorReading {
            recorded_at: self.recorded_at.unwrap_or(ingested_at),
            payload: self.payload,
        }
    }
}

/// 一次测量事件，写入后不可变。
#[derive(Debug, Clone)]
pub struct SensorReading {
    pub recorded_at: DateTime<Utc>,
    pub payload: SensorPayload,
}

/// 一次接入调用的完整输入。
#[derive(Debug, Clone)]
pub struct SensorReadingInput {
    pub identity: AuthIdentity,
    pub device: DeviceIdentity,
    pub reading: SensorReading,
}

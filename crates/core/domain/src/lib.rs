pub mod data;

pub use data::{DeviceIdentity, ReadingDraft, SensorPayload, SensorReading, SensorReadingInput};

/// 认证身份：由认证中间件从 ID token 中解析出的调用方。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// 外部主体 ID（token `sub`），稳定且唯一。
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthIdentity {
    /// 构造认证身份，空白的可选字段视为缺省。
    pub fn new(
        subject_id: impl Into<String>,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: non_blank(email),
            display_name: non_blank(display_name),
        }
    }

    /// 仅包含主体 ID 的身份。
    pub fn subject(subject_id: impl Into<String>) -> Self {
        Self::new(subject_id, None, None)
    }
}

/// 去除首尾空格，空字符串归一为 None。
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

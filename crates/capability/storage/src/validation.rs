//! 验证辅助函数
//!
//! 存储实现写入前的最小校验：
//! - ensure_reading_input：主体 ID 与外部设备 ID 非空

use crate::error::StorageError;
use domain::SensorReadingInput;

/// 验证接入输入的自然键非空。
pub fn ensure_reading_input(input: &SensorReadingInput) -> Result<(), StorageError> {
    if input.identity.subject_id.trim().is_empty() {
        return Err(StorageError::Invalid("subject_id required".to_string()));
    }
    if input.device.external_id.trim().is_empty() {
        return Err(StorageError::Invalid("device external_id required".to_string()));
    }
    Ok(())
}

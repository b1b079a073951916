//! 存储接口 Trait 定义
//!
//! - SensorDataStore：传感器读数接入存储
//!
//! 设计原则：
//! - 一次调用即一个事务：用户、设备、读数要么全部落库，要么全部回滚
//! - 所有接口返回 StorageError，原始错误信息不做改写
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::StoredReading;
use async_trait::async_trait;
use domain::SensorReadingInput;

/// 传感器读数存储接口
#[async_trait]
pub trait SensorDataStore: Send + Sync {
    /// 在单个事务内完成：用户 upsert -> 设备 upsert -> 读数追加。
    ///
    /// 任一步失败时整体回滚并返回原始错误，不做重试。
    async fn store_reading(
        &self,
        input: &SensorReadingInput,
    ) -> Result<StoredReading, StorageError>;
}

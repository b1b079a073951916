//! 存储层错误类型
//!
//! 统一的存储错误类型，保留底层错误本身（可通过 `source()` 取回）：
//! - Database：SQL 执行、连接、事务提交/回滚错误
//! - Serialization：payload 序列化错误
//! - Invalid：写入前校验失败
//! - Unavailable：内存实现的锁或模拟故障

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Unavailable(String),
}

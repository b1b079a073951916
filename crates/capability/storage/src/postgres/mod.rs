//! # PostgreSQL 存储实现模块
//!
//! 生产环境使用的 `SensorDataStore` 实现。
//!
//! ## 设计原则
//!
//! 1. **单事务**：用户、设备、读数三步在同一事务与同一连接上执行
//! 2. **冲突即更新**：依赖唯一约束 + `on conflict do update`，不做先查后写
//! 3. **参数化查询**：所有 SQL 使用参数绑定
//! 4. **显式连接池**：连接池由调用方创建并注入
//!
//! ## 数据库模式要求
//!
//! - `users`：(id, subject_id unique, email, display_name)
//! - `devices`：(id, user_id, external_id, name, last_seen_at, unique(user_id, external_id))
//! - `sensor_readings`：(id, device_id, recorded_at, payload)
//!
//! 建表脚本见 `migrations/0001_sensor_ingest.sql`，可通过 `ensure_schema` 执行。

pub mod sensor;

pub use sensor::*;

//! Postgres 传感器读数存储实现
//!
//! 一次 `store_reading` 对应一个事务：
//! 1. upsert_user：按 subject_id 插入或更新用户
//! 2. upsert_device：按 (user_id, external_id) 插入或更新设备
//! 3. insert_reading：追加一条读数
//!
//! 两个 upsert 都是单条 `insert ... on conflict ... do update ... returning id`，
//! 依赖唯一约束消除“先查后写”的并发竞争。

use crate::error::StorageError;
use crate::models::{ProfileUpdatePolicy, StoredReading, payload_text};
use crate::traits::SensorDataStore;
use crate::validation::ensure_reading_input;
use chrono::{DateTime, Utc};
use domain::{AuthIdentity, DeviceIdentity, SensorReadingInput};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, warn};

const UPSERT_USER_OVERWRITE: &str = "insert into users (subject_id, email, display_name) \
     values ($1, $2, $3) \
     on conflict (subject_id) do update \
     set email = excluded.email, display_name = excluded.display_name, updated_at = now() \
     returning id";

const UPSERT_USER_COALESCE: &str = "insert into users (subject_id, email, display_name) \
     values ($1, $2, $3) \
     on conflict (subject_id) do update \
     set email = coalesce(excluded.email, users.email), \
         display_name = coalesce(excluded.display_name, users.display_name), \
         updated_at = now() \
     returning id";

const UPSERT_DEVICE: &str = "insert into devices (user_id, external_id, name) \
     values ($1, $2, $3) \
     on conflict (user_id, external_id) do update \
     set name = coalesce(excluded.name, devices.name), last_seen_at = now() \
     returning id";

const INSERT_READING: &str = "insert into sensor_readings (device_id, recorded_at, payload) \
     values ($1, $2, $3) returning id";

pub struct PgSensorDataStore {
    pool: PgPool,
    profile_policy: ProfileUpdatePolicy,
}

impl PgSensorDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            profile_policy: ProfileUpdatePolicy::default(),
        }
    }

    /// 指定重复主体的资料更新策略。
    pub fn with_profile_policy(mut self, policy: ProfileUpdatePolicy) -> Self {
        self.profile_policy = policy;
        self
    }
}

#[async_trait::async_trait]
impl SensorDataStore for PgSensorDataStore {
    async fn store_reading(
        &self,
        input: &SensorReadingInput,
    ) -> Result<StoredReading, StorageError> {
        ensure_reading_input(input)?;
        let payload = payload_text(&input.reading.payload)?;

        let mut tx = self.pool.begin().await?;
        let result = write_reading(&mut *tx, self.profile_policy, input, &payload).await;

        match result {
            Ok(stored) => {
                tx.commit().await?;
                debug!(
                    target: "aiot.storage",
                    user_id = stored.user_id,
                    device_id = stored.device_id,
                    reading_id = stored.reading_id,
                    "sensor_reading_stored"
                );
                Ok(stored)
            }
            Err(err) => {
                // 回滚失败不覆盖原始错误；连接随事务释放回连接池
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(target: "aiot.storage", error = %rollback_err, "rollback_failed");
                }
                error!(
                    target: "aiot.storage",
                    subject_id = %input.identity.subject_id,
                    external_device_id = %input.device.external_id,
                    error = %err,
                    "sensor_reading_store_failed"
                );
                Err(err)
            }
        }
    }
}

/// 事务内的三个步骤，严格按顺序执行。
async fn write_reading(
    conn: &mut PgConnection,
    policy: ProfileUpdatePolicy,
    input: &SensorReadingInput,
    payload: &str,
) -> Result<StoredReading, StorageError> {
    let user_id = upsert_user(conn, policy, &input.identity).await?;
    let device_id = upsert_device(conn, user_id, &input.device).await?;
    let reading_id = insert_reading(conn, device_id, input.reading.recorded_at, payload).await?;
    Ok(StoredReading {
        user_id,
        device_id,
        reading_id,
    })
}

async fn upsert_user(
    conn: &mut PgConnection,
    policy: ProfileUpdatePolicy,
    identity: &AuthIdentity,
) -> Result<i64, StorageError> {
    let sql = match policy {
        ProfileUpdatePolicy::Overwrite => UPSERT_USER_OVERWRITE,
        ProfileUpdatePolicy::Coalesce => UPSERT_USER_COALESCE,
    };
    let id: i64 = sqlx::query_scalar(sql)
        .bind(&identity.subject_id)
        .bind(identity.email.as_deref())
        .bind(identity.display_name.as_deref())
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn upsert_device(
    conn: &mut PgConnection,
    user_id: i64,
    device: &DeviceIdentity,
) -> Result<i64, StorageError> {
    // 空名称按缺省处理，避免覆盖已有名称
    let name = device.name.as_deref().filter(|name| !name.trim().is_empty());
    let id: i64 = sqlx::query_scalar(UPSERT_DEVICE)
        .bind(user_id)
        .bind(&device.external_id)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn insert_reading(
    conn: &mut PgConnection,
    device_id: i64,
    recorded_at: DateTime<Utc>,
    payload: &str,
) -> Result<i64, StorageError> {
    let id: i64 = sqlx::query_scalar(INSERT_READING)
        .bind(device_id)
        .bind(recorded_at)
        .bind(payload)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

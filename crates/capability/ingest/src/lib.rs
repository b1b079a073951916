//! 传感器读数接入服务：补全默认时间戳、校验自然键、记录指标，
//! 再委托存储在单个事务内完成写入。

use aiot_storage::{SensorDataStore, StorageError, StoredReading};
use chrono::Utc;
use domain::{AuthIdentity, DeviceIdentity, ReadingDraft, SensorReadingInput};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// 接入错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid input {field}: {message}")]
    InvalidInput {
        /// 出错的字段（请求体中的字段名）。
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 传感器读数接入服务。
#[derive(Clone)]
pub struct SensorIngestService {
    store: Arc<dyn SensorDataStore>,
}

impl SensorIngestService {
    pub fn new(store: Arc<dyn SensorDataStore>) -> Self {
        Self { store }
    }

    /// 记录一条读数；未提供 recorded_at 时取当前时间。
    pub async fn record_reading(
        &self,
        identity: AuthIdentity,
        device: DeviceIdentity,
        draft: ReadingDraft,
    ) -> Result<StoredReading, IngestError> {
        aiot_telemetry::record_ingest_request();
        if identity.subject_id.trim().is_empty() {
            aiot_telemetry::record_rejected_invalid();
            return Err(IngestError::InvalidInput {
                field: "subjectId",
                message: "subject_id required".to_string(),
            });
        }
        if device.external_id.trim().is_empty() {
            aiot_telemetry::record_rejected_invalid();
            return Err(IngestError::InvalidInput {
                field: "deviceId",
                message: "device_id required".to_string(),
            });
        }

        let input = SensorReadingInput {
            identity,
            device,
            reading: draft.finalize(Utc::now()),
        };
        let started = Instant::now();
        let result = self.store.store_reading(&input).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        aiot_telemetry::record_ingest_latency_ms(latency_ms);

        match result {
            Ok(stored) => {
                aiot_telemetry::record_ingest_success();
                debug!(
                    target: "aiot.ingest",
                    subject_id = %input.identity.subject_id,
                    device_id = %input.device.external_id,
                    reading_id = stored.reading_id,
                    latency_ms,
                    "sensor_reading_ingested"
                );
                if latency_ms > 1_000 {
                    warn!(target: "aiot.ingest", latency_ms, "sensor_reading_slow");
                }
                Ok(stored)
            }
            Err(err) => {
                aiot_telemetry::record_ingest_failure();
                error!(
                    target: "aiot.ingest",
                    subject_id = %input.identity.subject_id,
                    device_id = %input.device.external_id,
                    error = %err,
                    "sensor_reading_ingest_failed"
                );
                Err(IngestError::Storage(err))
            }
        }
    }
}

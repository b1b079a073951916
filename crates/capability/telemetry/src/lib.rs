//! 追踪、请求 ID 生成与接入计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 日志输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 接入指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub ingest_requests: u64,
    pub ingest_success: u64,
    pub ingest_failure: u64,
    pub rejected_invalid: u64,
    pub rejected_unauthenticated: u64,
    pub ingest_latency_ms_total: u64,
    pub ingest_latency_ms_count: u64,
}

/// 接入指标。
pub struct TelemetryMetrics {
    ingest_requests: AtomicU64,
    ingest_success: AtomicU64,
    ingest_failure: AtomicU64,
    rejected_invalid: AtomicU64,
    rejected_unauthenticated: AtomicU64,
    ingest_latency_ms_total: AtomicU64,
    ingest_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            ingest_requests: AtomicU64::new(0),
            ingest_success: AtomicU64::new(0),
            ingest_failure: AtomicU64::new(0),
            rejected_invalid: AtomicU64::new(0),
            rejected_unauthenticated: AtomicU64::new(0),
            ingest_latency_ms_total: AtomicU64::new(0),
            ingest_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ingest_requests: self.ingest_requests.load(Ordering::Relaxed),
            ingest_success: self.ingest_success.load(Ordering::Relaxed),
            ingest_failure: self.ingest_failure.load(Ordering::Relaxed),
            rejected_invalid: self.rejected_invalid.load(Ordering::Relaxed),
            rejected_unauthenticated: self.rejected_unauthenticated.load(Ordering::Relaxed),
            ingest_latency_ms_total: self.ingest_latency_ms_total.load(Ordering::Relaxed),
            ingest_latency_ms_count: self.ingest_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 按指定格式初始化 tracing（默认 info，RUST_LOG 控制过滤级别）。
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = match format {
        LogFormat::Text => fmt().with_env_filter(filter).try_init(),
        LogFormat::Json => fmt().json().with_env_filter(filter).try_init(),
    };
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录接入请求次数。
pub fn record_ingest_request() {
    metrics().ingest_requests.fetch_add(1, Ordering::Relaxed);
}

/// 记录接入成功次数。
pub fn record_ingest_success() {
    metrics().ingest_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录接入失败次数（存储错误）。
pub fn record_ingest_failure() {
    metrics().ingest_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录校验失败被拒次数。
pub fn record_rejected_invalid() {
    metrics().rejected_invalid.fetch_add(1, Ordering::Relaxed);
}

/// 记录未认证被拒次数。
pub fn record_rejected_unauthenticated() {
    metrics()
        .rejected_unauthenticated
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录接入耗时（毫秒）。
pub fn record_ingest_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .ingest_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .ingest_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

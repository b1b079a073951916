use aiot_telemetry::{
    LogFormat, TelemetryMetrics, metrics, record_ingest_latency_ms, record_ingest_request,
    record_rejected_invalid,
};

#[test]
fn fresh_metrics_start_at_zero() {
    let snapshot = TelemetryMetrics::new().snapshot();
    assert_eq!(snapshot.ingest_requests, 0);
    assert_eq!(snapshot.ingest_latency_ms_count, 0);
}

#[test]
fn global_counters_only_grow() {
    let before = metrics().snapshot();
    record_ingest_request();
    record_rejected_invalid();
    record_ingest_latency_ms(12);
    let after = metrics().snapshot();

    assert!(after.ingest_requests > before.ingest_requests);
    assert!(after.rejected_invalid > before.rejected_invalid);
    assert!(after.ingest_latency_ms_total >= before.ingest_latency_ms_total + 12);
    assert!(after.ingest_latency_ms_count > before.ingest_latency_ms_count);
}

#[test]
fn log_format_parses_known_values() {
    assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
    assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
    assert_eq!(LogFormat::parse("xml"), None);
}

#[test]
fn init_tracing_is_idempotent() {
    aiot_telemetry::init_tracing(LogFormat::Json);
    aiot_telemetry::init_tracing(LogFormat::Text);
}

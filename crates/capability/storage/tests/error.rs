use aiot_storage::{StorageError, payload_text};
use std::error::Error;

#[test]
fn database_error_keeps_sqlx_source() {
    let err: StorageError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, StorageError::Database(sqlx::Error::RowNotFound)));

    let source = err.source().expect("source");
    assert!(source.downcast_ref::<sqlx::Error>().is_some());
}

#[test]
fn pool_timeout_stays_distinguishable() {
    let err: StorageError = sqlx::Error::PoolTimedOut.into();
    assert!(matches!(err, StorageError::Database(sqlx::Error::PoolTimedOut)));
    assert!(err.to_string().contains("pool timed out"));
}

#[test]
fn serialization_error_keeps_source() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
    let err: StorageError = json_err.into();
    assert!(matches!(err, StorageError::Serialization(_)));
    assert!(err.source().is_some());
}

#[test]
fn payload_text_is_compact_json() {
    let mut payload = domain::SensorPayload::new();
    payload.insert("temp".to_string(), serde_json::json!(21.5));
    assert_eq!(payload_text(&payload).expect("text"), r#"{"temp":21.5}"#);
}

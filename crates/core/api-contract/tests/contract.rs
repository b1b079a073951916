use api_contract::{SensorReadingRequest, SensorReadingStoredDto};

#[test]
fn sensor_request_reads_camel_case_fields() {
    let request: SensorReadingRequest = serde_json::from_value(serde_json::json!({
        "deviceId": "d1",
        "deviceName": "Sensor A",
        "recordedAt": "2024-05-01T12:00:00Z",
        "payload": {"temp": 21.5}
    }))
    .expect("request");

    assert_eq!(request.device_id.as_deref(), Some("d1"));
    assert_eq!(request.device_name.as_deref(), Some("Sensor A"));
    assert!(request.recorded_at.is_some());
    assert!(request.payload.is_some_and(|payload| payload.is_object()));
}

#[test]
fn sensor_request_missing_fields_default_to_none() {
    let request: SensorReadingRequest =
        serde_json::from_value(serde_json::json!({})).expect("request");
    assert!(request.device_id.is_none());
    assert!(request.payload.is_none());
}

#[test]
fn stored_dto_uses_camel_case() {
    let dto = SensorReadingStoredDto {
        user_id: 1,
        device_id: 2,
        reading_id: 3,
        message: "sensor reading stored".to_string(),
    };
    let value = serde_json::to_value(&dto).expect("json");
    assert_eq!(value["userId"], 1);
    assert_eq!(value["deviceId"], 2);
    assert_eq!(value["readingId"], 3);
}

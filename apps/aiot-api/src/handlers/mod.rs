//! Handlers 模块

pub mod health;
pub mod metrics;
pub mod sensors;

pub use health::*;
pub use metrics::*;
pub use sensors::*;

#[cfg(test)]
pub mod test_support {
    use crate::AppState;
    use aiot_auth::IdTokenVerifier;
    use aiot_ingest::SensorIngestService;
    use aiot_storage::{InMemorySensorDataStore, SensorDataStore};
    use axum::http::{HeaderMap, HeaderValue, header};
    use domain::AuthIdentity;
    use std::sync::Arc;

    pub const TEST_SECRET: &str = "secret";

    /// 基于内存存储的应用状态。
    pub fn test_state() -> (AppState, Arc<InMemorySensorDataStore>) {
        let store = Arc::new(InMemorySensorDataStore::new());
        (test_state_with_store(store.clone()), store)
    }

    /// 使用指定存储的应用状态。
    pub fn test_state_with_store(store: Arc<dyn SensorDataStore>) -> AppState {
        AppState {
            auth: Arc::new(IdTokenVerifier::with_secret(TEST_SECRET)),
            ingest: Arc::new(SensorIngestService::new(store)),
        }
    }

    pub fn bearer(subject: &str) -> String {
        let identity = AuthIdentity::new(
            subject,
            Some(format!("{subject}@example.com")),
            None,
        );
        let token = IdTokenVerifier::with_secret(TEST_SECRET)
            .issue(&identity, 3600)
            .expect("token");
        format!("Bearer {token}")
    }

    pub fn auth_headers(subject: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&bearer(subject)).expect("header"),
        );
        headers
    }
}

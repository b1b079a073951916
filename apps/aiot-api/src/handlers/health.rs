//! 健康检查
//!
//! - GET /health
//! - GET /health/auth（需 Bearer token，返回调用方 uid）

use api_contract::{AuthHealthDto, HealthDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{AppState, middleware::require_identity};

pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(HealthDto {
            status: "ok".to_string(),
        }),
    )
        .into_response()
}

pub async fn health_auth(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = match require_identity(&state, &headers).await {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    (
        StatusCode::OK,
        Json(AuthHealthDto {
            status: "ok".to_string(),
            uid: identity.subject_id,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{auth_headers, test_state};

    #[tokio::test]
    async fn health_auth_requires_token() {
        let (state, _) = test_state();
        let response = health_auth(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_auth_returns_subject() {
        let (state, _) = test_state();
        let response = health_auth(State(state), auth_headers("user-1")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

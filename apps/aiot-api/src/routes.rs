//! 路由定义
//!
//! 集中管理所有 API 路由与全局中间件：
//! - 健康检查：/health, /health/auth
//! - 读数上报：/api/sensors/data
//! - 指标快照：/api/metrics
//!
//! 中间件自外向内：request_context、CORS、超时封装、超时、请求体大小限制。

use super::AppState;
use super::handlers::*;
use super::middleware::{request_context, timeout_envelope};
use aiot_config::AppConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;

/// HTTP 层参数。
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// 为空时回显请求来源。
    pub allowed_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl HttpOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            body_limit_bytes: config.body_limit_bytes,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        }
    }
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            body_limit_bytes: 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/sensors/data", post(store_sensor_data))
        .route("/metrics", get(get_metrics))
}

/// 创建完整应用路由
pub fn create_router(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/auth", get(health_auth))
        .nest("/api", create_api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(options.body_limit_bytes))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(middleware::map_response(timeout_envelope))
        .layer(cors_layer(&options.allowed_origins))
        // 注入 request_id/trace_id（最外层，覆盖所有响应）
        .layer(middleware::from_fn(request_context))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            header::HeaderName::from_static("x-request-id"),
            header::HeaderName::from_static("x-trace-id"),
        ])
}

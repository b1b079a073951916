//! AIoT 传感器接入 HTTP API：健康检查、认证检查、读数上报与指标快照。

mod handlers;
mod middleware;
mod routes;
mod utils;

use aiot_auth::{IdTokenVerifier, JwksOptions, VerifierKey};
use aiot_config::AppConfig;
use aiot_ingest::SensorIngestService;
use aiot_storage::{PgSensorDataStore, ProfileUpdatePolicy, connect_pool, ensure_schema};
use aiot_telemetry::{LogFormat, init_tracing};
use routes::HttpOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 应用共享状态。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<IdTokenVerifier>,
    pub ingest: Arc<SensorIngestService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing(LogFormat::parse(&config.log_format).unwrap_or_default());

    // ID token 校验器：JWKS 优先，其次 RS256 公钥，最后 HS256 共享密钥
    let key = if let Some(url) = &config.jwt_jwks_url {
        VerifierKey::Jwks(JwksOptions {
            refresh_every: Duration::from_secs(config.jwt_jwks_refresh_seconds),
            ..JwksOptions::new(url.clone())
        })
    } else if let Some(pem) = &config.jwt_public_key_pem {
        VerifierKey::RsaPublicPem(pem.clone())
    } else if let Some(secret) = &config.jwt_secret {
        VerifierKey::Secret(secret.clone())
    } else {
        return Err("AIOT_JWT_SECRET, AIOT_JWT_PUBLIC_KEY_PEM or AIOT_JWT_JWKS_URL required".into());
    };
    let auth = Arc::new(IdTokenVerifier::new(
        key,
        config.jwt_issuer.clone(),
        config.jwt_audience.clone(),
    )?);
    // 预拉取失败不阻止启动，首个请求会再次尝试
    if let Err(err) = auth.warm_up().await {
        warn!(error = %err, "jwks_warm_up_failed");
    }

    // Postgres 连接池由此处创建并注入存储
    let pool = connect_pool(&config.database_url, config.db_max_connections).await?;
    if config.db_auto_migrate {
        ensure_schema(&pool).await?;
        info!("schema_ready");
    }
    let policy = ProfileUpdatePolicy::parse(&config.profile_update).unwrap_or_default();
    let store = Arc::new(PgSensorDataStore::new(pool.clone()).with_profile_policy(policy));
    let ingest = Arc::new(SensorIngestService::new(store));
    let state = AppState { auth, ingest };

    let app = routes::create_router(state, &HttpOptions::from_config(&config));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(
        addr = %config.http_addr,
        profile_update = policy.as_str(),
        "http_server_started"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("http_server_stopped");
    Ok(())
}

/// 等待 Ctrl-C 或 SIGTERM。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "ctrl_c_listener_failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "sigterm_listener_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown_signal_received");
}

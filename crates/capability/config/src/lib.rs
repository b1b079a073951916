//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_auto_migrate: bool,
    pub jwt_secret: Option<String>,
    pub jwt_public_key_pem: Option<String>,
    /// 远程 JWKS 地址；配置后按 kid 选取公钥。
    pub jwt_jwks_url: Option<String>,
    pub jwt_jwks_refresh_seconds: u64,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    /// 为空表示回显任意请求来源。
    pub allowed_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub request_timeout_seconds: u64,
    /// `overwrite` 或 `coalesce`。
    pub profile_update: String,
    /// `text` 或 `json`。
    pub log_format: String,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = read_optional("AIOT_DATABASE_URL")
            .ok_or_else(|| ConfigError::Missing("AIOT_DATABASE_URL".to_string()))?;
        let jwt_secret = read_optional("AIOT_JWT_SECRET");
        // 单行环境变量里的 PEM 通常以字面 \n 分隔
        let jwt_public_key_pem =
            read_optional("AIOT_JWT_PUBLIC_KEY_PEM").map(|pem| pem.replace("\\n", "\n"));
        let jwt_jwks_url = read_optional("AIOT_JWT_JWKS_URL");
        if jwt_secret.is_none() && jwt_public_key_pem.is_none() && jwt_jwks_url.is_none() {
            return Err(ConfigError::Missing(
                "AIOT_JWT_SECRET, AIOT_JWT_PUBLIC_KEY_PEM or AIOT_JWT_JWKS_URL".to_string(),
            ));
        }
        let jwt_jwks_refresh_seconds = read_u64_with_default("AIOT_JWT_JWKS_REFRESH_SECONDS", 3600)?;
        let jwt_issuer = read_optional("AIOT_JWT_ISSUER");
        let jwt_audience = read_optional("AIOT_JWT_AUDIENCE");
        let http_addr = env::var("AIOT_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
        let db_max_connections = read_u32_with_default("AIOT_DB_MAX_CONNECTIONS", 8)?;
        let db_auto_migrate = read_bool_with_default("AIOT_DB_AUTO_MIGRATE", true);
        let allowed_origins = parse_origins(&env::var("AIOT_ALLOWED_ORIGINS").unwrap_or_default());
        let body_limit_bytes = read_u64_with_default("AIOT_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let body_limit_bytes = usize::try_from(body_limit_bytes).map_err(|_| {
            ConfigError::Invalid("AIOT_BODY_LIMIT_BYTES".to_string(), body_limit_bytes.to_string())
        })?;
        let request_timeout_seconds = read_u64_with_default("AIOT_REQUEST_TIMEOUT_SECONDS", 30)?;
        let profile_update = read_choice("AIOT_PROFILE_UPDATE", &["overwrite", "coalesce"])?;
        let log_format = read_choice("AIOT_LOG_FORMAT", &["text", "json"])?;

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            db_auto_migrate,
            jwt_secret,
            jwt_public_key_pem,
            jwt_jwks_url,
            jwt_jwks_refresh_seconds,
            jwt_issuer,
            jwt_audience,
            allowed_origins,
            body_limit_bytes,
            request_timeout_seconds,
            profile_update,
            log_format,
        })
    }
}

/// 解析逗号分隔的来源列表，忽略空项。
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// 读取枚举型配置，缺省取第一个候选值。
fn read_choice(key: &str, choices: &[&str]) -> Result<String, ConfigError> {
    let Some(value) = read_optional(key) else {
        return Ok(choices.first().copied().unwrap_or_default().to_string());
    };
    let normalized = value.trim().to_ascii_lowercase();
    if choices.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(ConfigError::Invalid(key.to_string(), value))
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

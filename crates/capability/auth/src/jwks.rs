//! 远程 JWKS 公钥集：按 kid 选取 RS256 公钥，支持密钥轮换。
//!
//! - 缓存过期（refresh_every）后重新拉取
//! - 遇到未知 kid 时立即重新拉取（受 min_refresh_interval 限制）
//! - 拉取失败时继续使用已缓存的公钥

use crate::AuthError;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// JWKS 拉取请求超时。
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// JWKS 公钥集配置。
#[derive(Debug, Clone)]
pub struct JwksOptions {
    /// JWKS 地址，例如 Firebase 的
    /// `https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com`。
    pub url: String,
    /// 缓存有效期。
    pub refresh_every: Duration,
    /// 两次拉取之间的最短间隔。
    pub min_refresh_interval: Duration,
}

impl JwksOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            refresh_every: Duration::from_secs(3600),
            min_refresh_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Default)]
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
    attempted_at: Option<Instant>,
}

pub(crate) struct RemoteKeySet {
    options: JwksOptions,
    http_client: reqwest::Client,
    cache: RwLock<CachedKeys>,
    refresh_guard: Mutex<()>,
}

impl RemoteKeySet {
    pub(crate) fn new(options: JwksOptions) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        Ok(Self {
            options,
            http_client,
            cache: RwLock::new(CachedKeys::default()),
            refresh_guard: Mutex::new(()),
        })
    }

    /// 取 kid 对应的公钥；必要时重新拉取公钥集。
    pub(crate) async fn key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.fresh_key(kid).await {
            return Ok(key);
        }

        // 同一时刻只允许一个拉取；等待者复查缓存
        let _guard = self.refresh_guard.lock().await;
        if let Some(key) = self.fresh_key(kid).await {
            return Ok(key);
        }

        let refreshed = if self.may_refresh().await {
            Some(self.refresh().await)
        } else {
            None
        };

        let cache = self.cache.read().await;
        if let Some(key) = cache.keys.get(kid) {
            return Ok(key.clone());
        }
        match refreshed {
            Some(Err(err)) if cache.keys.is_empty() => Err(err),
            _ => Err(AuthError::TokenInvalid),
        }
    }

    /// 启动时预拉取公钥集。
    pub(crate) async fn warm_up(&self) -> Result<usize, AuthError> {
        let _guard = self.refresh_guard.lock().await;
        self.refresh().await
    }

    async fn fresh_key(&self, kid: &str) -> Option<DecodingKey> {
        let cache = self.cache.read().await;
        let fresh = cache
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.options.refresh_every);
        if !fresh {
            return None;
        }
        cache.keys.get(kid).cloned()
    }

    async fn may_refresh(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .attempted_at
            .is_none_or(|at| at.elapsed() >= self.options.min_refresh_interval)
    }

    async fn refresh(&self) -> Result<usize, AuthError> {
        self.cache.write().await.attempted_at = Some(Instant::now());

        let jwks = match self.fetch().await {
            Ok(jwks) => jwks,
            Err(err) => {
                warn!(target: "aiot.auth", url = %self.options.url, error = %err, "jwks_refresh_failed");
                return Err(err);
            }
        };

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => warn!(target: "aiot.auth", kid = %kid, error = %err, "jwk_skipped"),
            }
        }

        let count = keys.len();
        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        info!(target: "aiot.auth", url = %self.options.url, keys = count, "jwks_refreshed");
        Ok(count)
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .http_client
            .get(&self.options.url)
            .send()
            .await
            .map_err(|err| AuthError::Internal(format!("jwks fetch failed: {err}")))?;
        if !response.status().is_success() {
            return Err(AuthError::Internal(format!(
                "jwks fetch failed: HTTP {}",
                response.status()
            )));
        }
        response
            .json::<JwkSet>()
            .await
            .map_err(|err| AuthError::Internal(format!("jwks decode failed: {err}")))
    }
}

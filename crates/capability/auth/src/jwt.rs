use crate::AuthError;
use crate::jwks::{JwksOptions, RemoteKeySet};
use domain::AuthIdentity;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize)]
/// ID token 中使用到的 claims。
struct Claims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    // aud 可能是数组，由 Validation 直接校验原始 claims，这里只用于签发
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    aud: Option<String>,
}

/// 校验密钥。
pub enum VerifierKey {
    /// HS256 共享密钥。
    Secret(String),
    /// RS256 公钥（PEM）。
    RsaPublicPem(String),
    /// RS256 远程公钥集（JWKS），按 token 头部的 kid 选取公钥。
    Jwks(JwksOptions),
}

enum KeySource {
    Static(DecodingKey),
    Remote(RemoteKeySet),
}

/// ID token 校验器。
pub struct IdTokenVerifier {
    algorithm: Algorithm,
    keys: KeySource,
    signing_secret: Option<Vec<u8>>,
    issuer: Option<String>,
    audience: Option<String>,
}

impl IdTokenVerifier {
    /// 创建校验器；PEM 无法解析时返回 Internal。
    pub fn new(
        key: VerifierKey,
        issuer: Option<String>,
        audience: Option<String>,
    ) -> Result<Self, AuthError> {
        let (algorithm, keys, signing_secret) = match key {
            VerifierKey::Secret(secret) => {
                let bytes = secret.into_bytes();
                (
                    Algorithm::HS256,
                    KeySource::Static(DecodingKey::from_secret(&bytes)),
                    Some(bytes),
                )
            }
            VerifierKey::RsaPublicPem(pem) => {
                let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|err| AuthError::Internal(err.to_string()))?;
                (Algorithm::RS256, KeySource::Static(decoding_key), None)
            }
            VerifierKey::Jwks(options) => (
                Algorithm::RS256,
                KeySource::Remote(RemoteKeySet::new(options)?),
                None,
            ),
        };
        Ok(Self {
            algorithm,
            keys,
            signing_secret,
            issuer,
            audience,
        })
    }

    /// HS256 校验器快捷构造。
    pub fn with_secret(secret: impl Into<String>) -> Self {
        let bytes = secret.into().into_bytes();
        Self {
            algorithm: Algorithm::HS256,
            keys: KeySource::Static(DecodingKey::from_secret(&bytes)),
            signing_secret: Some(bytes),
            issuer: None,
            audience: None,
        }
    }

    /// 校验 token 并映射为身份。
    pub async fn verify(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }
        let remote_key;
        let decoding_key = match &self.keys {
            KeySource::Static(key) => key,
            KeySource::Remote(remote) => {
                let header = jsonwebtoken::decode_header(token).map_err(map_jwt_error)?;
                let kid = header.kid.ok_or(AuthError::TokenInvalid)?;
                remote_key = remote.key(&kid).await?;
                &remote_key
            }
        };
        let decoded = jsonwebtoken::decode::<Claims>(token, decoding_key, &self.validation())
            .map_err(map_jwt_error)?;
        let claims = decoded.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(AuthIdentity::new(claims.sub, claims.email, claims.name))
    }

    /// 预拉取远程公钥集，返回可用公钥数量；静态密钥直接返回 0。
    pub async fn warm_up(&self) -> Result<usize, AuthError> {
        match &self.keys {
            KeySource::Static(_) => Ok(0),
            KeySource::Remote(remote) => remote.warm_up().await,
        }
    }

    /// 签发 HS256 token（本地联调与测试使用）。
    pub fn issue(&self, identity: &AuthIdentity, ttl_seconds: i64) -> Result<String, AuthError> {
        let secret = self
            .signing_secret
            .as_ref()
            .ok_or_else(|| AuthError::Internal("signing requires a shared secret".to_string()))?;
        let exp = (now_epoch_seconds() as i64 + ttl_seconds).max(0) as usize;
        let claims = Claims {
            sub: identity.subject_id.clone(),
            email: identity.email.clone(),
            name: identity.display_name.clone(),
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|err| AuthError::Internal(err.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

/// 当前时间戳（秒）。
fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}

//! 认证能力：Bearer ID token 校验，解析为已认证身份。

mod jwks;
mod jwt;

pub use jwks::JwksOptions;
pub use jwt::{IdTokenVerifier, VerifierKey};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token missing")]
    TokenMissing,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

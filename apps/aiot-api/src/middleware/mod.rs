//! 中间件模块

pub mod auth;
pub mod timeout;

pub use auth::*;
pub use timeout::*;

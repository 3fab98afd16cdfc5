//! # Tourney Identity
//!
//! 赛事平台的身份与访问核心：令牌签发、轮换、吊销，不透明引用令牌校验与角色权限

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod logging;
pub mod rbac;
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{IdentityError, Result};

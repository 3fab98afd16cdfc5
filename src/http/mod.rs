//! # HTTP 层
//!
//! 认证/授权中间件与最小化的身份相关路由

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use middleware::{ScopeGuard, extract_credential, require_auth, require_permission};
pub use server::{AppState, create_router, serve};

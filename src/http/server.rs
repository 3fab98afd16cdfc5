//! # HTTP 服务器
//!
//! 应用状态、路由装配与监听

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{MethodRouter, get, post},
};
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::middleware::{ScopeGuard, require_auth, require_permission};
use crate::app::AppContext;
use crate::auth::scopes::{OPENID, PROFILE, SECURITY};
use crate::error::{IdentityError, Result};

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 需要认证与角色权限的路由
fn guarded(
    state: &AppState,
    scopes: &'static [&'static str],
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route
        .route_layer(from_fn_with_state(state.clone(), require_permission))
        .route_layer(from_fn_with_state(
            ScopeGuard::new(state.clone(), scopes),
            require_auth,
        ))
}

/// 仅需要认证的路由
fn authenticated(
    state: &AppState,
    scopes: &'static [&'static str],
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(
        ScopeGuard::new(state.clone(), scopes),
        require_auth,
    ))
}

/// 创建路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/me",
            guarded(&state, &[OPENID, PROFILE], get(handlers::me)),
        )
        .route(
            "/me/permissions",
            guarded(&state, &[PROFILE], get(handlers::my_permissions)),
        )
        .route("/roles", guarded(&state, &[PROFILE], get(handlers::roles)))
        .route("/auth/refresh", post(handlers::refresh))
        .route(
            "/auth/logout",
            authenticated(&state, &[SECURITY], get(handlers::logout)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 监听并服务，直到收到 Ctrl-C
pub async fn serve(context: Arc<AppContext>) -> Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        context.config.server.host, context.config.server.port
    )
    .parse()
    .map_err(|e| IdentityError::config_with_source("无效的监听地址", e))?;

    let router = create_router(AppState::new(context));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP 服务已启动");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("收到退出信号，正在关闭");
            }
        })
        .await?;
    Ok(())
}

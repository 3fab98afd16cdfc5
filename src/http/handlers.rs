//! # 请求处理器

use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::cookies::{auth_cookie, clear_auth_cookie};
use super::response::ApiResponse;
use super::server::AppState;
use crate::auth::{RequestClaims, TokenSet, UserInfo};
use crate::error::Result;
use crate::rbac::{Permission, RequestPermissions, Role};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// 数据库可达即健康
pub async fn health(State(state): State<AppState>) -> Result<ApiResponse<HealthStatus>> {
    crate::database::health(&state.db).await?;
    Ok(ApiResponse::Success(HealthStatus { status: "ok" }))
}

/// 当前用户的声明，按令牌授予的 scope 裁剪
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<RequestClaims>>,
) -> Result<ApiResponse<UserInfo>> {
    let info = state
        .userinfo
        .set_userinfo_from_scopes(&claims.subject, claims.scopes.as_slice())
        .await?;
    Ok(ApiResponse::Success(info))
}

pub async fn my_permissions(
    Extension(permissions): Extension<RequestPermissions>,
) -> ApiResponse<Vec<Permission>> {
    ApiResponse::Success(permissions.permissions)
}

pub async fn roles(State(state): State<AppState>) -> ApiResponse<Vec<Role>> {
    ApiResponse::Success(state.rbac.rbac().list().into_iter().cloned().collect())
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 轮换第一方刷新令牌，并写入新的认证 Cookie
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Response> {
    let set = state
        .sessions
        .refresh_first_party_session(&body.refresh_token)
        .await?;
    let cookie = auth_cookie(&state.config.auth.cookie, &set.access_token, set.expires_in)?;
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::<TokenSet>::Success(set)).into_response())
}

/// 吊销当前令牌并清除认证 Cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<RequestClaims>>,
) -> Result<Response> {
    state.sessions.logout(&claims).await?;
    let cookie = clear_auth_cookie(&state.config.auth.cookie)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::<()>::SuccessWithoutData("已退出登录".to_string()),
    )
        .into_response())
}

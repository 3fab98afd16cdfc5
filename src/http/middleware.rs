//! # 认证与授权中间件
//!
//! `require_auth` 校验引用令牌并注入 `RequestClaims`；
//! `require_permission` 按路由模板与方法做角色权限判断

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use super::cookies::find_cookie;
use super::server::AppState;
use crate::auth::{RequestClaims, check_scopes};
use crate::error::{IdentityError, Result};
use crate::rbac::{RequestPermissions, check_permission};

/// 路由级认证要求：任一 scope 即可通过，为空时只要求令牌有效
#[derive(Clone)]
pub struct ScopeGuard {
    pub state: AppState,
    pub scopes: &'static [&'static str],
}

impl ScopeGuard {
    #[must_use]
    pub const fn new(state: AppState, scopes: &'static [&'static str]) -> Self {
        Self { state, scopes }
    }
}

/// 提取凭证：优先 `Authorization: Bearer`，其次认证 Cookie
#[must_use]
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| find_cookie(value, cookie_name))
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

/// 认证中间件
pub async fn require_auth(
    State(guard): State<ScopeGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let cookie_name = &guard.state.config.auth.cookie.name;
    let credential = extract_credential(request.headers(), cookie_name)
        .ok_or_else(|| IdentityError::unauthorized("missing credential"))?;

    let claims = guard.state.gate.validate(&credential).await?;
    if !guard.scopes.is_empty() {
        check_scopes(&claims, guard.scopes)?;
    }

    request.extensions_mut().insert(Arc::new(claims));
    Ok(next.run(request).await)
}

/// 权限中间件，需在 `require_auth` 之后执行；未认证的请求直接放行
pub async fn require_permission(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let Some(claims) = request.extensions().get::<Arc<RequestClaims>>().cloned() else {
        return Ok(next.run(request).await);
    };

    let user_id = claims.user_id()?;
    let permissions = state.rbac.permissions_for_user(user_id).await?;

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());
    let method = request.method().as_str();

    if !check_permission(&permissions, &path, method) {
        warn!(user_id, path = %path, method, "permission denied");
        return Err(IdentityError::forbidden("permission denied"));
    }

    request
        .extensions_mut()
        .insert(RequestPermissions { permissions });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "auth=from-cookie"),
        ]);
        assert_eq!(extract_credential(&map, "auth").as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_fallback() {
        let map = headers(&[(header::COOKIE, "a=1; auth=from-cookie")]);
        assert_eq!(extract_credential(&map, "auth").as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_credential(&map, "auth"), None);
    }

    #[test]
    fn test_empty_bearer_ignored() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert_eq!(extract_credential(&map, "auth"), None);
    }
}

//! Auth cookie construction.

use axum::http::HeaderValue;

use crate::config::{CookieConfig, SameSitePolicy};
use crate::error::{IdentityError, Result};

/// `Set-Cookie` value carrying an access-token reference.
pub fn auth_cookie(config: &CookieConfig, value: &str, max_age_secs: i64) -> Result<HeaderValue> {
    render(config, value, config.same_site, max_age_secs.max(0))
}

/// `Set-Cookie` value that expires the auth cookie.
pub fn clear_auth_cookie(config: &CookieConfig) -> Result<HeaderValue> {
    render(config, "", SameSitePolicy::Lax, 0)
}

fn render(
    config: &CookieConfig,
    value: &str,
    same_site: SameSitePolicy,
    max_age_secs: i64,
) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age_secs}",
        config.name,
        same_site.as_str()
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| IdentityError::server_error_with_source("无法构造 Cookie", e))
}

/// Value of cookie `name` from a `Cookie` header.
#[must_use]
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

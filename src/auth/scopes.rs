//! Scope vocabulary understood by the identity core.

/// Grants the subject identifier.
pub const OPENID: &str = "openid";
/// Grants profile claims (names, nickname, picture, locale).
pub const PROFILE: &str = "profile";
/// Grants the email address and its verification flag.
pub const EMAIL: &str = "email";
/// Allows a refresh token to be issued.
pub const OFFLINE_ACCESS: &str = "offline_access";
/// Application scope gating administrative operations.
pub const SECURITY: &str = "security";

/// Scopes granted to a first-party session.
pub const FIRST_PARTY: [&str; 5] = [OPENID, OFFLINE_ACCESS, PROFILE, EMAIL, SECURITY];

/// Audience granted to a first-party session.
pub const ANY_AUDIENCE: &str = "*";

/// True when `granted` contains at least one of `acceptable`.
///
/// An empty `acceptable` set never matches.
#[must_use]
pub fn intersects<S: AsRef<str>>(granted: &[S], acceptable: &[&str]) -> bool {
    acceptable
        .iter()
        .any(|wanted| granted.iter().any(|scope| scope.as_ref() == *wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_is_or() {
        let granted = [OPENID.to_string(), EMAIL.to_string()];
        assert!(intersects(&granted, &[SECURITY, EMAIL]));
        assert!(!intersects(&granted, &[SECURITY]));
        assert!(!intersects(&granted, &[]));
    }
}

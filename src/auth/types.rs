//! Request and result types exchanged with the protocol engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A grant that is about to become a token pair.
///
/// Built by the protocol engine after a successful code exchange, or from a
/// [`RefreshTokenRequest`] when a refresh token is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub subject: String,
    pub client_id: String,
    pub audience: Vec<String>,
    pub scopes: Vec<String>,
    pub auth_time: DateTime<Utc>,
    pub amr: Vec<String>,
}

impl TokenRequest {
    #[must_use]
    pub fn new(subject: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            client_id: client_id.into(),
            audience: Vec::new(),
            scopes: Vec::new(),
            auth_time: Utc::now(),
            amr: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_amr<I, S>(mut self, amr: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amr = amr.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_auth_time(mut self, auth_time: DateTime<Utc>) -> Self {
        self.auth_time = auth_time;
        self
    }
}

/// A stored refresh token seen through the protocol engine's eyes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRequest {
    pub token_id: String,
    pub subject: String,
    pub user_id: String,
    pub client_id: String,
    pub audience: Vec<String>,
    pub scopes: Vec<String>,
    pub auth_time: DateTime<Utc>,
    pub amr: Vec<String>,
}

impl RefreshTokenRequest {
    /// Narrow the scopes carried into the next token pair.
    ///
    /// Scopes that were never granted to this lineage are dropped.
    pub fn set_current_scopes<S: AsRef<str>>(&mut self, requested: &[S]) {
        self.scopes
            .retain(|granted| requested.iter().any(|scope| scope.as_ref() == granted.as_str()));
    }
}

impl From<entity::auth_refresh_tokens::Model> for RefreshTokenRequest {
    fn from(model: entity::auth_refresh_tokens::Model) -> Self {
        Self {
            token_id: model.id,
            subject: model.subject,
            user_id: model.user_id,
            client_id: model.application_id,
            audience: model.audience.into_inner(),
            scopes: model.scopes.into_inner(),
            auth_time: model.auth_time.and_utc(),
            amr: model.amr.into_inner(),
        }
    }
}

impl From<RefreshTokenRequest> for TokenRequest {
    fn from(request: RefreshTokenRequest) -> Self {
        Self {
            subject: request.subject,
            client_id: request.client_id,
            audience: request.audience,
            scopes: request.scopes,
            auth_time: request.auth_time,
            amr: request.amr,
        }
    }
}

/// RFC 8693 token type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "urn:ietf:params:oauth:token-type:access_token")]
    AccessToken,
    #[serde(rename = "urn:ietf:params:oauth:token-type:refresh_token")]
    RefreshToken,
    #[serde(rename = "urn:ietf:params:oauth:token-type:id_token")]
    IdToken,
    #[serde(rename = "urn:ietf:params:oauth:token-type:jwt")]
    Jwt,
}

/// A validated token exchange grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchangeRequest {
    pub client_id: String,
    pub subject: String,
    pub audience: Vec<String>,
    pub scopes: Vec<String>,
    pub auth_time: DateTime<Utc>,
    pub subject_token_type: TokenType,
    pub requested_token_type: Option<TokenType>,
    /// Scopes the issued tokens will carry; set during validation.
    pub current_scopes: Vec<String>,
}

impl TokenExchangeRequest {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        subject: impl Into<String>,
        subject_token_type: TokenType,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            subject: subject.into(),
            audience: Vec::new(),
            scopes: Vec::new(),
            auth_time: Utc::now(),
            subject_token_type,
            requested_token_type: None,
            current_scopes: Vec::new(),
        }
    }

    /// The grant the exchange issues. No authentication event happened, so
    /// `amr` stays empty.
    #[must_use]
    pub fn to_token_request(&self) -> TokenRequest {
        let scopes = if self.current_scopes.is_empty() {
            self.scopes.clone()
        } else {
            self.current_scopes.clone()
        };
        TokenRequest {
            subject: self.subject.clone(),
            client_id: self.client_id.clone(),
            audience: self.audience.clone(),
            scopes,
            auth_time: self.auth_time,
            amr: Vec::new(),
        }
    }
}

/// Result of a pair issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token_id: String,
    pub refresh_token: String,
    pub expiration: DateTime<Utc>,
}

/// Result of an access-token-only issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccessToken {
    pub token_id: String,
    pub expiration: DateTime<Utc>,
}

/// Per-request identity derived by the auth gate. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestClaims {
    pub token_id: String,
    pub subject: String,
    pub scopes: Vec<String>,
}

impl RequestClaims {
    /// The numeric user id carried in `subject`.
    pub fn user_id(&self) -> crate::error::Result<i32> {
        self.subject
            .parse()
            .map_err(|_| crate::error::IdentityError::forbidden("subject is not a user id"))
    }
}

/// Token response handed to the first-party frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn refresh_request() -> RefreshTokenRequest {
        RefreshTokenRequest {
            token_id: "r1".into(),
            subject: "7".into(),
            user_id: "7".into(),
            client_id: "web".into(),
            audience: vec!["web".into()],
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
            auth_time: Utc::now(),
            amr: vec!["pwd".into()],
        }
    }

    #[test]
    fn test_set_current_scopes_only_narrows() {
        let mut request = refresh_request();
        request.set_current_scopes(&["email", "security"]);
        assert_eq!(request.scopes, vec!["email".to_string()]);
    }

    #[test]
    fn test_refresh_request_into_token_request_keeps_auth_context() {
        let request = refresh_request();
        let auth_time = request.auth_time;
        let token_request = TokenRequest::from(request);

        assert_eq!(token_request.subject, "7");
        assert_eq!(token_request.client_id, "web");
        assert_eq!(token_request.auth_time, auth_time);
        assert_eq!(token_request.amr, vec!["pwd".to_string()]);
    }

    #[test]
    fn test_exchange_drops_amr_and_prefers_current_scopes() {
        let mut exchange = TokenExchangeRequest::new("svc", "7", TokenType::AccessToken);
        exchange.scopes = vec!["openid".into(), "email".into()];
        exchange.current_scopes = vec!["openid".into()];

        let request = exchange.to_token_request();
        assert!(request.amr.is_empty());
        assert_eq!(request.scopes, vec!["openid".to_string()]);
    }

    #[test]
    fn test_claims_user_id() {
        let claims = RequestClaims {
            token_id: "t".into(),
            subject: "42".into(),
            scopes: vec![],
        };
        assert_eq!(claims.user_id().unwrap(), 42);

        let claims = RequestClaims {
            subject: "svc-account".into(),
            ..claims
        };
        assert!(claims.user_id().is_err());
    }
}

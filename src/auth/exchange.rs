//! Token exchange (RFC 8693) hooks.

use serde_json::{Map, Value};
use tracing::info;

use super::types::{TokenExchangeRequest, TokenType};
use crate::error::{IdentityError, Result};

/// Normalize and vet an exchange request before any token is issued.
///
/// The requested type defaults to a refresh token, turning an ID token into a
/// refresh token is refused, and the issued scopes are the requested ones.
pub fn validate_token_exchange_request(request: &mut TokenExchangeRequest) -> Result<()> {
    let requested = *request
        .requested_token_type
        .get_or_insert(TokenType::RefreshToken);

    if request.subject_token_type == TokenType::IdToken && requested == TokenType::RefreshToken {
        return Err(IdentityError::invalid_request(
            "exchanging id_token to refresh_token is not supported",
        ));
    }

    request.current_scopes.clone_from(&request.scopes);
    Ok(())
}

/// Record an accepted exchange.
pub fn create_token_exchange_request(request: &TokenExchangeRequest) {
    info!(
        client_id = %request.client_id,
        subject = %request.subject,
        subject_token_type = ?request.subject_token_type,
        requested_token_type = ?request.requested_token_type,
        "token exchange accepted"
    );
}

/// Extra claims for exchanged tokens. None are added.
#[must_use]
pub fn private_claims(_request: &TokenExchangeRequest) -> Map<String, Value> {
    Map::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_requested_type_is_refresh_token() {
        let mut request = TokenExchangeRequest::new("svc", "7", TokenType::AccessToken);
        request.scopes = vec!["openid".into()];

        validate_token_exchange_request(&mut request).unwrap();
        assert_eq!(request.requested_token_type, Some(TokenType::RefreshToken));
        assert_eq!(request.current_scopes, vec!["openid".to_string()]);
    }

    #[test]
    fn test_id_token_to_refresh_token_is_refused() {
        let mut request = TokenExchangeRequest::new("svc", "7", TokenType::IdToken);
        let err = validate_token_exchange_request(&mut request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_id_token_to_access_token_is_allowed() {
        let mut request = TokenExchangeRequest::new("svc", "7", TokenType::IdToken);
        request.requested_token_type = Some(TokenType::AccessToken);
        assert!(validate_token_exchange_request(&mut request).is_ok());
    }

    #[test]
    fn test_private_claims_empty() {
        let request = TokenExchangeRequest::new("svc", "7", TokenType::Jwt);
        assert!(private_claims(&request).is_empty());
    }
}

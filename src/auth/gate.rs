//! Auth gate: resolves an opaque reference token into request claims.
//!
//! Every call decrypts the presented value and loads the access-token row, so
//! deleting the row revokes the credential immediately.

use chrono::Utc;
use std::sync::Arc;

use super::cipher::ReferenceCipher;
use super::scopes;
use super::store::CredentialStore;
use super::types::RequestClaims;
use crate::error::{IdentityError, Result};

pub struct AuthGate {
    store: CredentialStore,
    cipher: Arc<dyn ReferenceCipher>,
}

impl AuthGate {
    #[must_use]
    pub fn new(store: CredentialStore, cipher: Arc<dyn ReferenceCipher>) -> Self {
        Self { store, cipher }
    }

    /// The opaque value handed to clients for an access token.
    pub fn encode_reference(&self, token_id: &str, subject: &str) -> Result<String> {
        self.cipher.encrypt(&format!("{token_id}:{subject}"))
    }

    /// Resolve a presented bearer value.
    pub async fn validate(&self, presented: &str) -> Result<RequestClaims> {
        if presented.is_empty() {
            return Err(IdentityError::unauthorized("missing credential"));
        }
        let payload = self.cipher.decrypt(presented)?;
        let (token_id, subject) = parse_reference(&payload)
            .ok_or_else(|| IdentityError::unauthorized("invalid token format"))?;

        let token = self
            .store
            .access_token(token_id)
            .await?
            .ok_or_else(|| IdentityError::unauthorized("auth token not found"))?;
        if !token.is_active_at(Utc::now().naive_utc()) {
            return Err(IdentityError::unauthorized("token expired"));
        }
        if token.subject != subject {
            return Err(IdentityError::unauthorized("subject mismatch"));
        }

        Ok(RequestClaims {
            token_id: token.id,
            subject: token.subject,
            scopes: token.scopes.into_inner(),
        })
    }
}

/// Reject unless the claims carry at least one of `acceptable`.
pub fn check_scopes(claims: &RequestClaims, acceptable: &[&str]) -> Result<()> {
    if scopes::intersects(claims.scopes.as_slice(), acceptable) {
        Ok(())
    } else {
        Err(IdentityError::forbidden(format!(
            "missing one of the required scopes: {}",
            acceptable.join(", ")
        )))
    }
}

/// Split `"<tokenID>:<subject>"`; both parts must be non-empty and there must
/// be exactly one separator.
#[must_use]
pub fn parse_reference(payload: &str) -> Option<(&str, &str)> {
    let mut parts = payload.split(':');
    let token_id = parts.next()?;
    let subject = parts.next()?;
    if parts.next().is_some() || token_id.is_empty() || subject.is_empty() {
        return None;
    }
    Some((token_id, subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cipher::AesGcmCipher;
    use crate::auth::store::NewAccessToken;
    use crate::error::ErrorKind;
    use crate::testing::create_test_db;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case("abc:42", Some(("abc", "42")))]
    #[case("abc", None)]
    #[case(":42", None)]
    #[case("abc:", None)]
    #[case("a:b:c", None)]
    #[case("", None)]
    fn test_parse_reference(#[case] payload: &str, #[case] expected: Option<(&str, &str)>) {
        assert_eq!(parse_reference(payload), expected);
    }

    #[test]
    fn test_check_scopes_any_one_suffices() {
        let claims = RequestClaims {
            token_id: "t".into(),
            subject: "7".into(),
            scopes: vec!["openid".into(), "profile".into()],
        };
        assert!(check_scopes(&claims, &["security", "profile"]).is_ok());
        assert_eq!(
            check_scopes(&claims, &["security"]).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            check_scopes(&claims, &[]).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
    }

    async fn gate_with_token(expires_in: Duration) -> AuthGate {
        let store = CredentialStore::new(Arc::new(create_test_db().await.unwrap()));
        let tx = store.begin().await.unwrap();
        tx.insert_access_token(NewAccessToken {
            id: "tok".into(),
            application_id: "web".into(),
            subject: "7".into(),
            refresh_token_id: None,
            audience: vec![],
            scopes: vec!["openid".into()],
            expiration: Utc::now() + expires_in,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        AuthGate::new(store, Arc::new(AesGcmCipher::from_secret("secret")))
    }

    #[tokio::test]
    async fn test_validate_live_token() {
        let gate = gate_with_token(Duration::minutes(5)).await;
        let value = gate.encode_reference("tok", "7").unwrap();

        let claims = gate.validate(&value).await.unwrap();
        assert_eq!(claims.token_id, "tok");
        assert_eq!(claims.subject, "7");
        assert_eq!(claims.scopes, vec!["openid".to_string()]);
    }

    #[tokio::test]
    async fn test_validate_expired_token() {
        let gate = gate_with_token(-Duration::seconds(1)).await;
        let value = gate.encode_reference("tok", "7").unwrap();
        assert_eq!(
            gate.validate(&value).await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
    }

    #[rstest]
    #[case("missing:7")]
    #[case("tok:8")]
    #[case("tok")]
    #[case("tok:7:extra")]
    #[tokio::test]
    async fn test_validate_rejects(#[case] payload: &str) {
        let gate = gate_with_token(Duration::minutes(5)).await;
        let value = gate.cipher.encrypt(payload).unwrap();
        assert_eq!(
            gate.validate(&value).await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_validate_rejects_empty_and_garbage() {
        let gate = gate_with_token(Duration::minutes(5)).await;
        for value in ["", "garbage"] {
            assert_eq!(
                gate.validate(value).await.unwrap_err().kind(),
                ErrorKind::Unauthorized
            );
        }
    }
}

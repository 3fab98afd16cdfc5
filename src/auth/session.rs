//! First-party sessions for the platform's own frontend.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::gate::AuthGate;
use super::issuance::TokenIssuer;
use super::revocation::TokenRevoker;
use super::scopes::{ANY_AUDIENCE, FIRST_PARTY};
use super::types::{RequestClaims, TokenRequest, TokenSet};
use crate::error::Result;

pub const BEARER: &str = "Bearer";

pub struct FirstPartySessions {
    issuer: Arc<TokenIssuer>,
    revoker: Arc<TokenRevoker>,
    gate: Arc<AuthGate>,
    client_id: String,
    amr: Vec<String>,
}

impl FirstPartySessions {
    #[must_use]
    pub fn new(
        issuer: Arc<TokenIssuer>,
        revoker: Arc<TokenRevoker>,
        gate: Arc<AuthGate>,
        client_id: String,
        amr: Vec<String>,
    ) -> Self {
        Self {
            issuer,
            revoker,
            gate,
            client_id,
            amr,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Issue a token pair for the built-in client once the external login
    /// has resolved `user_id`. The access token is returned as an encrypted
    /// reference.
    pub async fn issue_first_party_session(&self, user_id: i32) -> Result<TokenSet> {
        let subject = user_id.to_string();
        let request = TokenRequest::new(subject.as_str(), self.client_id.as_str())
            .with_scopes(FIRST_PARTY)
            .with_audience([ANY_AUDIENCE])
            .with_amr(self.amr.iter().cloned())
            .with_auth_time(Utc::now());

        let issued = self
            .issuer
            .create_access_and_refresh_tokens(&request, None)
            .await?;
        let access_token = self.gate.encode_reference(&issued.access_token_id, &subject)?;

        info!(user_id, client_id = %self.client_id, "first-party session issued");
        Ok(TokenSet {
            access_token,
            refresh_token: issued.refresh_token,
            token_type: BEARER.to_string(),
            expires_in: (issued.expiration - Utc::now()).num_seconds(),
            scope: FIRST_PARTY.join(" "),
        })
    }

    /// Rotate a first-party refresh token into a new pair. Tokens issued to
    /// any other client are rejected by the rotation itself.
    pub async fn refresh_first_party_session(&self, refresh_token: &str) -> Result<TokenSet> {
        let stored = self.issuer.token_request_by_refresh_token(refresh_token).await?;
        let mut request = TokenRequest::from(stored);
        request.client_id.clone_from(&self.client_id);

        let issued = self
            .issuer
            .create_access_and_refresh_tokens(&request, Some(refresh_token))
            .await?;
        let access_token = self
            .gate
            .encode_reference(&issued.access_token_id, &request.subject)?;

        info!(subject = %request.subject, client_id = %self.client_id, "first-party session refreshed");
        Ok(TokenSet {
            access_token,
            refresh_token: issued.refresh_token,
            token_type: BEARER.to_string(),
            expires_in: (issued.expiration - Utc::now()).num_seconds(),
            scope: request.scopes.join(" "),
        })
    }

    /// Revoke the access token backing the current request.
    pub async fn logout(&self, claims: &RequestClaims) -> Result<()> {
        self.revoker
            .revoke_token(&claims.token_id, &claims.subject, &self.client_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cipher::AesGcmCipher;
    use crate::auth::lock::GlobalWriteLock;
    use crate::auth::policy::TtlPolicy;
    use crate::auth::store::CredentialStore;
    use crate::error::ErrorKind;
    use crate::testing::create_test_db;
    use pretty_assertions::assert_eq;

    async fn sessions() -> (FirstPartySessions, Arc<AuthGate>) {
        let store = CredentialStore::new(Arc::new(create_test_db().await.unwrap()));
        let lock: Arc<dyn crate::auth::lock::WriteSerializer> = Arc::new(GlobalWriteLock::default());
        let issuer = Arc::new(TokenIssuer::new(
            store.clone(),
            Arc::new(TtlPolicy::default()),
            lock.clone(),
        ));
        let revoker = Arc::new(TokenRevoker::new(store.clone(), lock));
        let gate = Arc::new(AuthGate::new(
            store,
            Arc::new(AesGcmCipher::from_secret("session-secret")),
        ));
        let sessions = FirstPartySessions::new(
            issuer,
            revoker,
            gate.clone(),
            "builtin".into(),
            vec!["intra42".into()],
        );
        (sessions, gate)
    }

    #[tokio::test]
    async fn test_session_token_resolves_through_gate() {
        let (sessions, gate) = sessions().await;
        let set = sessions.issue_first_party_session(42).await.unwrap();

        assert_eq!(set.token_type, "Bearer");
        assert_eq!(set.scope, "openid offline_access profile email security");
        // builtin is a trusted client: 30 days
        assert!(set.expires_in > 29 * 24 * 3600);

        let claims = gate.validate(&set.access_token).await.unwrap();
        assert_eq!(claims.subject, "42");
        assert_eq!(claims.scopes.len(), FIRST_PARTY.len());
    }

    #[tokio::test]
    async fn test_logout_revokes_current_token() {
        let (sessions, gate) = sessions().await;
        let set = sessions.issue_first_party_session(42).await.unwrap();
        let claims = gate.validate(&set.access_token).await.unwrap();

        sessions.logout(&claims).await.unwrap();

        let err = gate.validate(&set.access_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let again = sessions.logout(&claims).await.unwrap_err();
        assert_eq!(again.kind(), ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_refresh_rotates_session() {
        let (sessions, gate) = sessions().await;
        let first = sessions.issue_first_party_session(42).await.unwrap();

        let second = sessions
            .refresh_first_party_session(&first.refresh_token)
            .await
            .unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(second.scope, first.scope);
        let claims = gate.validate(&second.access_token).await.unwrap();
        assert_eq!(claims.subject, "42");

        // the consumed refresh token cannot be replayed
        let err = sessions
            .refresh_first_party_session(&first.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRefreshToken);
    }

    #[tokio::test]
    async fn test_refresh_rejects_third_party_token() {
        let (sessions, _gate) = sessions().await;
        let request = TokenRequest::new("42", "partner-app").with_scopes(["offline_access"]);
        let issued = sessions
            .issuer
            .create_access_and_refresh_tokens(&request, None)
            .await
            .unwrap();

        let err = sessions
            .refresh_first_party_session(&issued.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRefreshToken);
    }
}

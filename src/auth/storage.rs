//! Storage contract consumed by the external OpenID protocol engine.

use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::exchange;
use super::issuance::{RefreshTokenInfo, TokenIssuer};
use super::revocation::TokenRevoker;
use super::signing::{JwkSet, SigningKeyProvider};
use super::store::CredentialStore;
use super::types::{
    IssuedAccessToken, IssuedTokens, RefreshTokenRequest, TokenExchangeRequest, TokenRequest,
};
use super::userinfo::{Introspection, UserInfo, UserInfoProjector};
use crate::error::{IdentityError, Result};

/// Everything the protocol engine needs from persistence.
#[async_trait]
pub trait OidcStorage: Send + Sync {
    async fn save_auth_code(&self, auth_request_id: &str, code: &str) -> Result<()>;

    /// Redeem an authorization code, returning the authorization request id.
    async fn consume_auth_code(&self, code: &str) -> Result<String>;

    async fn create_access_and_refresh_tokens(
        &self,
        request: &TokenRequest,
        current_refresh_token: Option<&str>,
    ) -> Result<IssuedTokens>;

    async fn create_tokens_from_exchange(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<IssuedTokens>;

    async fn create_access_token(&self, request: &TokenRequest) -> Result<IssuedAccessToken>;

    async fn token_request_by_refresh_token(&self, refresh_token: &str)
    -> Result<RefreshTokenRequest>;

    async fn revoke_token(&self, token_id: &str, subject: &str, client_id: &str) -> Result<()>;

    async fn terminate_session(&self, user_id: &str, client_id: &str) -> Result<()>;

    async fn get_refresh_token_info(&self, client_id: &str, token: &str)
    -> Result<RefreshTokenInfo>;

    async fn set_userinfo_from_scopes(
        &self,
        user_id: &str,
        client_id: &str,
        scopes: &[String],
    ) -> Result<UserInfo>;

    async fn set_userinfo_from_token(
        &self,
        token_id: &str,
        subject: &str,
        origin: &str,
    ) -> Result<UserInfo>;

    async fn set_introspection_from_token(
        &self,
        token_id: &str,
        subject: &str,
        client_id: &str,
    ) -> Result<Introspection>;

    async fn get_private_claims_from_scopes(
        &self,
        user_id: &str,
        client_id: &str,
        scopes: &[String],
    ) -> Result<Map<String, Value>>;

    fn signing_key(&self) -> &SigningKeyProvider;

    fn signature_algorithms(&self) -> Vec<Algorithm>;

    fn key_set(&self) -> JwkSet;

    async fn validate_token_exchange_request(&self, request: &mut TokenExchangeRequest)
    -> Result<()>;

    async fn create_token_exchange_request(&self, request: &TokenExchangeRequest) -> Result<()>;

    async fn get_private_claims_from_token_exchange_request(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<Map<String, Value>>;

    async fn set_userinfo_from_token_exchange_request(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<UserInfo>;

    async fn health(&self) -> Result<()>;
}

/// Database-backed [`OidcStorage`]. Each call is bounded by the configured
/// operation timeout; a timed-out write is rolled back when its transaction
/// is dropped.
pub struct IdentityStorage {
    store: CredentialStore,
    issuer: Arc<TokenIssuer>,
    revoker: Arc<TokenRevoker>,
    projector: UserInfoProjector,
    signing_key: Arc<SigningKeyProvider>,
    timeout: Duration,
}

impl IdentityStorage {
    #[must_use]
    pub fn new(
        store: CredentialStore,
        issuer: Arc<TokenIssuer>,
        revoker: Arc<TokenRevoker>,
        signing_key: Arc<SigningKeyProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            projector: UserInfoProjector::new(store.clone()),
            store,
            issuer,
            revoker,
            signing_key,
            timeout,
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    #[must_use]
    pub fn revoker(&self) -> &Arc<TokenRevoker> {
        &self.revoker
    }

    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        if let Ok(result) = tokio::time::timeout(self.timeout, future).await {
            result
        } else {
            warn!(operation, "storage operation timed out");
            Err(IdentityError::timeout(operation, self.timeout.as_secs()))
        }
    }
}

#[async_trait]
impl OidcStorage for IdentityStorage {
    async fn save_auth_code(&self, auth_request_id: &str, code: &str) -> Result<()> {
        self.bounded("save_auth_code", self.issuer.save_auth_code(auth_request_id, code))
            .await
    }

    async fn consume_auth_code(&self, code: &str) -> Result<String> {
        self.bounded("consume_auth_code", self.issuer.consume_auth_code(code))
            .await
    }

    async fn create_access_and_refresh_tokens(
        &self,
        request: &TokenRequest,
        current_refresh_token: Option<&str>,
    ) -> Result<IssuedTokens> {
        self.bounded(
            "create_access_and_refresh_tokens",
            self.issuer
                .create_access_and_refresh_tokens(request, current_refresh_token),
        )
        .await
    }

    async fn create_tokens_from_exchange(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<IssuedTokens> {
        self.bounded("exchange_tokens", self.issuer.exchange_tokens(request))
            .await
    }

    async fn create_access_token(&self, request: &TokenRequest) -> Result<IssuedAccessToken> {
        self.bounded("create_access_token", self.issuer.create_access_token(request))
            .await
    }

    async fn token_request_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshTokenRequest> {
        self.bounded(
            "token_request_by_refresh_token",
            self.issuer.token_request_by_refresh_token(refresh_token),
        )
        .await
    }

    async fn revoke_token(&self, token_id: &str, subject: &str, client_id: &str) -> Result<()> {
        self.bounded(
            "revoke_token",
            self.revoker.revoke_token(token_id, subject, client_id),
        )
        .await
    }

    async fn terminate_session(&self, user_id: &str, client_id: &str) -> Result<()> {
        self.bounded(
            "terminate_session",
            self.revoker.terminate_session(user_id, client_id),
        )
        .await
    }

    async fn get_refresh_token_info(
        &self,
        client_id: &str,
        token: &str,
    ) -> Result<RefreshTokenInfo> {
        self.bounded(
            "get_refresh_token_info",
            self.issuer.get_refresh_token_info(client_id, token),
        )
        .await
    }

    async fn set_userinfo_from_scopes(
        &self,
        user_id: &str,
        _client_id: &str,
        scopes: &[String],
    ) -> Result<UserInfo> {
        self.bounded(
            "set_userinfo_from_scopes",
            self.projector.set_userinfo_from_scopes(user_id, scopes),
        )
        .await
    }

    async fn set_userinfo_from_token(
        &self,
        token_id: &str,
        _subject: &str,
        _origin: &str,
    ) -> Result<UserInfo> {
        self.bounded(
            "set_userinfo_from_token",
            self.projector.set_userinfo_from_token(token_id),
        )
        .await
    }

    async fn set_introspection_from_token(
        &self,
        token_id: &str,
        subject: &str,
        _client_id: &str,
    ) -> Result<Introspection> {
        self.bounded(
            "set_introspection_from_token",
            self.projector.set_introspection_from_token(token_id, subject),
        )
        .await
    }

    async fn get_private_claims_from_scopes(
        &self,
        _user_id: &str,
        _client_id: &str,
        _scopes: &[String],
    ) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn signing_key(&self) -> &SigningKeyProvider {
        &self.signing_key
    }

    fn signature_algorithms(&self) -> Vec<Algorithm> {
        self.signing_key.signature_algorithms()
    }

    fn key_set(&self) -> JwkSet {
        self.signing_key.key_set()
    }

    async fn validate_token_exchange_request(
        &self,
        request: &mut TokenExchangeRequest,
    ) -> Result<()> {
        exchange::validate_token_exchange_request(request)
    }

    async fn create_token_exchange_request(&self, request: &TokenExchangeRequest) -> Result<()> {
        exchange::create_token_exchange_request(request);
        Ok(())
    }

    async fn get_private_claims_from_token_exchange_request(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<Map<String, Value>> {
        Ok(exchange::private_claims(request))
    }

    async fn set_userinfo_from_token_exchange_request(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<UserInfo> {
        let scopes = if request.current_scopes.is_empty() {
            &request.scopes
        } else {
            &request.current_scopes
        };
        self.bounded(
            "set_userinfo_from_token_exchange_request",
            self.projector
                .set_userinfo_from_scopes(&request.subject, scopes.as_slice()),
        )
        .await
    }

    async fn health(&self) -> Result<()> {
        self.bounded("health", async {
            crate::database::health(self.store.connection())
                .await
                .map_err(IdentityError::from)
        })
        .await
    }
}

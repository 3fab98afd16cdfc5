//! Token issuance: code exchange, refresh rotation and token exchange.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::lock::WriteSerializer;
use super::policy::TtlPolicy;
use super::store::{CredentialStore, NewAccessToken, NewRefreshToken, StoreTx};
use super::types::{
    IssuedAccessToken, IssuedTokens, RefreshTokenRequest, TokenExchangeRequest, TokenRequest,
};
use crate::error::{IdentityError, Result};

/// Identifies a refresh token for introspection and revocation endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenInfo {
    pub user_id: String,
    pub token_id: String,
}

pub struct TokenIssuer {
    store: CredentialStore,
    policy: Arc<TtlPolicy>,
    lock: Arc<dyn WriteSerializer>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(
        store: CredentialStore,
        policy: Arc<TtlPolicy>,
        lock: Arc<dyn WriteSerializer>,
    ) -> Self {
        Self {
            store,
            policy,
            lock,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// Issue an access/refresh pair.
    ///
    /// Without `current_refresh_token` this is a fresh grant. With one, the
    /// presented token is consumed: the new pair and the deletion of the old
    /// token commit together. A token that is unknown, expired, already consumed,
    /// or issued to another client or subject fails with `InvalidRefreshToken`.
    pub async fn create_access_and_refresh_tokens(
        &self,
        request: &TokenRequest,
        current_refresh_token: Option<&str>,
    ) -> Result<IssuedTokens> {
        let _guard = self.lock.acquire(&request.subject).await;
        match current_refresh_token {
            None => self.issue_fresh(request).await,
            Some(current) => self.rotate(request, current).await,
        }
    }

    /// Issue a pair for a validated token exchange. Always fresh, never
    /// linked to a previous refresh token, and without `amr`.
    pub async fn exchange_tokens(&self, request: &TokenExchangeRequest) -> Result<IssuedTokens> {
        let request = request.to_token_request();
        let _guard = self.lock.acquire(&request.subject).await;
        let issued = self.issue_fresh(&request).await?;
        info!(
            client_id = %request.client_id,
            subject = %request.subject,
            "issued tokens through token exchange"
        );
        Ok(issued)
    }

    /// Issue an access token with no paired refresh token.
    pub async fn create_access_token(&self, request: &TokenRequest) -> Result<IssuedAccessToken> {
        let _guard = self.lock.acquire(&request.subject).await;
        let now = Utc::now();
        let tx = self.store.begin().await?;
        let access = tx
            .insert_access_token(self.new_access_token(request, None, now))
            .await?;
        tx.commit().await?;

        Ok(IssuedAccessToken {
            token_id: access.id,
            expiration: access.expiration.and_utc(),
        })
    }

    /// Look up a live refresh token.
    pub async fn token_request_by_refresh_token(&self, token: &str) -> Result<RefreshTokenRequest> {
        let stored = self
            .store
            .refresh_token(token)
            .await?
            .filter(|stored| stored.is_active_at(Utc::now().naive_utc()))
            .ok_or_else(|| IdentityError::invalid_refresh_token("invalid refresh_token"))?;
        Ok(RefreshTokenRequest::from(stored))
    }

    pub async fn get_refresh_token_info(
        &self,
        client_id: &str,
        token: &str,
    ) -> Result<RefreshTokenInfo> {
        let stored = self
            .store
            .refresh_token(token)
            .await?
            .filter(|stored| stored.application_id == client_id)
            .ok_or_else(|| IdentityError::invalid_refresh_token("invalid refresh_token"))?;
        Ok(RefreshTokenInfo {
            user_id: stored.user_id,
            token_id: stored.id,
        })
    }

    /// Persist an authorization code for a completed authorization request.
    pub async fn save_auth_code(&self, auth_request_id: &str, code: &str) -> Result<()> {
        let _guard = self.lock.acquire(auth_request_id).await;
        let expiration = self.policy.auth_code_expiration(Utc::now());
        let tx = self.store.begin().await?;
        tx.insert_auth_code(code, auth_request_id, expiration)
            .await
            .map_err(|e| IdentityError::server_error_with_source("failed to save auth code", e))?;
        tx.commit().await
    }

    /// Redeem an authorization code, returning its authorization request id.
    ///
    /// The code is deleted whether or not it was still valid.
    pub async fn consume_auth_code(&self, code: &str) -> Result<String> {
        let _guard = self.lock.acquire(code).await;
        let tx = self.store.begin().await?;
        let stored = tx
            .auth_code(code)
            .await?
            .ok_or_else(|| IdentityError::access_denied("auth code not found"))?;
        tx.delete_auth_code(code).await?;
        tx.commit().await?;

        if !stored.is_valid_at(Utc::now().naive_utc()) {
            debug!("rejected expired auth code");
            return Err(IdentityError::access_denied("auth code expired"));
        }
        Ok(stored.auth_request_id)
    }

    async fn issue_fresh(&self, request: &TokenRequest) -> Result<IssuedTokens> {
        let now = Utc::now();
        let refresh_id = Uuid::new_v4().to_string();

        let tx = self.store.begin().await?;
        let access = tx
            .insert_access_token(self.new_access_token(request, Some(&refresh_id), now))
            .await?;
        let refresh = tx
            .insert_refresh_token(NewRefreshToken {
                id: refresh_id,
                subject: request.subject.clone(),
                user_id: request.subject.clone(),
                application_id: request.client_id.clone(),
                auth_time: request.auth_time,
                amr: request.amr.clone(),
                audience: request.audience.clone(),
                scopes: request.scopes.clone(),
                expiration: self.policy.refresh_token_expiration(now),
            })
            .await?;
        tx.commit().await?;

        debug!(client_id = %request.client_id, subject = %request.subject, "issued token pair");
        Ok(IssuedTokens {
            access_token_id: access.id,
            refresh_token: refresh.id,
            expiration: access.expiration.and_utc(),
        })
    }

    async fn rotate(&self, request: &TokenRequest, current: &str) -> Result<IssuedTokens> {
        let now = Utc::now();
        let tx = self.store.begin().await?;

        let Some(previous) = tx.refresh_token(current).await? else {
            return Err(IdentityError::invalid_refresh_token("refresh token not found"));
        };
        if !previous.is_active_at(now.naive_utc()) {
            discard_expired(tx, current).await?;
            return Err(IdentityError::invalid_refresh_token("refresh token expired"));
        }
        if previous.application_id != request.client_id {
            return Err(IdentityError::invalid_refresh_token(
                "refresh token was not issued to this client",
            ));
        }
        if previous.subject != request.subject {
            return Err(IdentityError::invalid_refresh_token(
                "refresh token belongs to another subject",
            ));
        }
        // a concurrent rotation that got here first leaves nothing to delete
        if tx.delete_refresh_token(current).await? == 0 {
            return Err(IdentityError::invalid_refresh_token("refresh token already used"));
        }

        let refresh_id = Uuid::new_v4().to_string();
        let access = tx
            .insert_access_token(self.new_access_token(request, Some(&refresh_id), now))
            .await?;
        let refresh = tx
            .insert_refresh_token(NewRefreshToken {
                id: refresh_id,
                subject: previous.subject,
                user_id: previous.user_id,
                application_id: previous.application_id,
                auth_time: request.auth_time,
                amr: previous.amr.into_inner(),
                audience: previous.audience.into_inner(),
                scopes: previous.scopes.into_inner(),
                expiration: self.policy.refresh_token_expiration(now),
            })
            .await?;
        tx.commit().await?;

        info!(
            client_id = %request.client_id,
            subject = %request.subject,
            "rotated refresh token"
        );
        Ok(IssuedTokens {
            access_token_id: access.id,
            refresh_token: refresh.id,
            expiration: access.expiration.and_utc(),
        })
    }

    fn new_access_token(
        &self,
        request: &TokenRequest,
        refresh_token_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> NewAccessToken {
        NewAccessToken {
            id: Uuid::new_v4().to_string(),
            application_id: request.client_id.clone(),
            subject: request.subject.clone(),
            refresh_token_id: refresh_token_id.map(str::to_string),
            audience: request.audience.clone(),
            scopes: request.scopes.clone(),
            expiration: self.policy.access_token_expiration(&request.client_id, now),
        }
    }
}

async fn discard_expired(tx: StoreTx, token: &str) -> Result<()> {
    tx.delete_refresh_token(token).await?;
    tx.commit().await
}

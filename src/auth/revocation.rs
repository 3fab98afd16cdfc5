//! Revocation of single tokens and subject-wide session termination.

use std::sync::Arc;
use tracing::{debug, info};

use super::lock::WriteSerializer;
use super::store::CredentialStore;
use crate::error::{IdentityError, Result};

pub struct TokenRevoker {
    store: CredentialStore,
    lock: Arc<dyn WriteSerializer>,
}

impl TokenRevoker {
    #[must_use]
    pub fn new(store: CredentialStore, lock: Arc<dyn WriteSerializer>) -> Self {
        Self { store, lock }
    }

    /// Revoke one access token and, when still present, its paired refresh
    /// token.
    ///
    /// A paired refresh token that was already rotated away is not an error.
    /// Storage failures always are.
    pub async fn revoke_token(&self, token_id: &str, subject: &str, client_id: &str) -> Result<()> {
        // partition by the stored subject so this serializes with rotations of the same lineage
        let Some(stored) = self.store.access_token(token_id).await? else {
            return Err(IdentityError::access_denied("token not found"));
        };
        if stored.subject != subject {
            debug!(client_id, "revocation subject differs from token subject");
        }
        let _guard = self.lock.acquire(&stored.subject).await;
        let tx = self.store.begin().await?;

        let Some(token) = tx.access_token(token_id).await? else {
            return Err(IdentityError::access_denied("token not found"));
        };
        if token.application_id != client_id {
            return Err(IdentityError::invalid_client(
                "token was not issued for this client",
            ));
        }

        tx.delete_access_token(token_id).await?;
        if let Some(refresh_id) = token.refresh_token_id.as_deref() {
            if tx.delete_refresh_token(refresh_id).await? == 0 {
                debug!("paired refresh token already gone");
            }
        }
        tx.commit().await?;

        info!(client_id, subject = %token.subject, "revoked access token");
        Ok(())
    }

    /// Delete every access token and refresh token belonging to `user_id`,
    /// across all clients.
    pub async fn terminate_session(&self, user_id: &str, client_id: &str) -> Result<()> {
        let _guard = self.lock.acquire(user_id).await;
        let tx = self.store.begin().await?;

        let access = tx.delete_access_tokens_by_subject(user_id).await.map_err(|e| {
            IdentityError::server_error_with_source("failed to delete tokens", e)
        })?;
        let refresh = tx.delete_refresh_tokens_by_user(user_id).await.map_err(|e| {
            IdentityError::server_error_with_source("failed to delete refresh tokens", e)
        })?;
        tx.commit().await?;

        info!(
            user_id,
            client_id,
            access_tokens = access,
            refresh_tokens = refresh,
            "terminated session"
        );
        Ok(())
    }
}

//! Credential store: persisted authorization codes, access tokens and
//! refresh tokens.
//!
//! Reads go through [`CredentialStore`] directly. Every write happens inside a
//! [`StoreTx`], so a failed issuance or revocation leaves no partial rows.

use chrono::{DateTime, Utc};
use entity::{
    AuthCodes, AuthRefreshTokens, AuthTokens, StringList, Users, auth_codes,
    auth_refresh_tokens, auth_tokens, users,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;

use crate::error::Result;

/// Access-token row about to be written.
#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub id: String,
    pub application_id: String,
    pub subject: String,
    pub refresh_token_id: Option<String>,
    pub audience: Vec<String>,
    pub scopes: Vec<String>,
    pub expiration: DateTime<Utc>,
}

/// Refresh-token row about to be written. `id` is also the opaque value
/// handed to the client.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: String,
    pub subject: String,
    pub user_id: String,
    pub application_id: String,
    pub auth_time: DateTime<Utc>,
    pub amr: Vec<String>,
    pub audience: Vec<String>,
    pub scopes: Vec<String>,
    pub expiration: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<DatabaseConnection>,
}

impl CredentialStore {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn access_token(&self, id: &str) -> Result<Option<auth_tokens::Model>> {
        Ok(find_access_token(self.connection(), id).await?)
    }

    pub async fn refresh_token(&self, id: &str) -> Result<Option<auth_refresh_tokens::Model>> {
        Ok(find_refresh_token(self.connection(), id).await?)
    }

    pub async fn user(&self, id: i32) -> Result<Option<users::Model>> {
        Ok(Users::find_by_id(id).one(self.connection()).await?)
    }

    /// Open a write transaction. Dropping the returned value without
    /// [`StoreTx::commit`] rolls everything back.
    pub(crate) async fn begin(&self) -> Result<StoreTx> {
        Ok(StoreTx {
            txn: self.db.begin().await?,
        })
    }
}

/// A write transaction over the credential tables.
pub(crate) struct StoreTx {
    txn: DatabaseTransaction,
}

impl StoreTx {
    pub async fn access_token(&self, id: &str) -> Result<Option<auth_tokens::Model>> {
        Ok(find_access_token(&self.txn, id).await?)
    }

    pub async fn refresh_token(&self, id: &str) -> Result<Option<auth_refresh_tokens::Model>> {
        Ok(find_refresh_token(&self.txn, id).await?)
    }

    pub async fn auth_code(&self, code: &str) -> Result<Option<auth_codes::Model>> {
        Ok(AuthCodes::find_by_id(code.to_string()).one(&self.txn).await?)
    }

    pub async fn insert_access_token(&self, token: NewAccessToken) -> Result<auth_tokens::Model> {
        let model = auth_tokens::ActiveModel {
            id: Set(token.id),
            application_id: Set(token.application_id),
            subject: Set(token.subject),
            refresh_token_id: Set(token.refresh_token_id),
            audience: Set(StringList(token.audience)),
            scopes: Set(StringList(token.scopes)),
            expiration: Set(token.expiration.naive_utc()),
        };
        Ok(model.insert(&self.txn).await?)
    }

    pub async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<auth_refresh_tokens::Model> {
        let model = auth_refresh_tokens::ActiveModel {
            id: Set(token.id),
            subject: Set(token.subject),
            user_id: Set(token.user_id),
            application_id: Set(token.application_id),
            auth_time: Set(token.auth_time.naive_utc()),
            amr: Set(StringList(token.amr)),
            audience: Set(StringList(token.audience)),
            scopes: Set(StringList(token.scopes)),
            expiration: Set(token.expiration.naive_utc()),
        };
        Ok(model.insert(&self.txn).await?)
    }

    pub async fn insert_auth_code(
        &self,
        code: &str,
        auth_request_id: &str,
        expiration: DateTime<Utc>,
    ) -> Result<()> {
        let model = auth_codes::ActiveModel {
            id: Set(code.to_string()),
            auth_request_id: Set(auth_request_id.to_string()),
            expiration: Set(expiration.naive_utc()),
        };
        model.insert(&self.txn).await?;
        Ok(())
    }

    /// Returns the number of rows removed (0 or 1).
    pub async fn delete_access_token(&self, id: &str) -> Result<u64> {
        let result = AuthTokens::delete_by_id(id.to_string())
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Returns the number of rows removed (0 or 1).
    pub async fn delete_refresh_token(&self, id: &str) -> Result<u64> {
        let result = AuthRefreshTokens::delete_by_id(id.to_string())
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_auth_code(&self, code: &str) -> Result<u64> {
        let result = AuthCodes::delete_by_id(code.to_string())
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_access_tokens_by_subject(&self, subject: &str) -> Result<u64> {
        let result = AuthTokens::delete_many()
            .filter(auth_tokens::Column::Subject.eq(subject))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_refresh_tokens_by_user(&self, user_id: &str) -> Result<u64> {
        let result = AuthRefreshTokens::delete_many()
            .filter(auth_refresh_tokens::Column::UserId.eq(user_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await?;
        Ok(())
    }
}

async fn find_access_token<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> std::result::Result<Option<auth_tokens::Model>, DbErr> {
    AuthTokens::find_by_id(id.to_string()).one(conn).await
}

async fn find_refresh_token<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> std::result::Result<Option<auth_refresh_tokens::Model>, DbErr> {
    AuthRefreshTokens::find_by_id(id.to_string()).one(conn).await
}

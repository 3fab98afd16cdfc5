//! User-claims projection.
//!
//! Claims are filled strictly per granted scope: a scope that was not granted
//! leaves its claim group empty.

use chrono::Utc;
use entity::users;
use serde::{Deserialize, Serialize};

use super::scopes;
use super::store::CredentialStore;
use crate::error::{IdentityError, Result};

/// Locale advertised in profile claims.
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserInfo {
    #[must_use]
    pub fn has_profile_claims(&self) -> bool {
        self.preferred_username.is_some()
            || self.name.is_some()
            || self.family_name.is_some()
            || self.given_name.is_some()
            || self.nickname.is_some()
            || self.locale.is_some()
            || self.picture.is_some()
    }
}

/// Introspection response for an active access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Introspection {
    pub active: bool,
    pub scope: Vec<String>,
    pub client_id: String,
    pub sub: String,
    #[serde(flatten)]
    pub userinfo: UserInfo,
}

/// Build claims for `user` limited to `granted` scopes.
#[must_use]
pub fn project<S: AsRef<str>>(user: &users::Model, subject: &str, granted: &[S]) -> UserInfo {
    let mut info = UserInfo::default();
    for scope in granted {
        match scope.as_ref() {
            scopes::OPENID => info.sub = Some(subject.to_string()),
            scopes::EMAIL => {
                info.email = Some(user.email.clone());
                info.email_verified = Some(true);
            }
            scopes::PROFILE => {
                info.preferred_username = Some(user.username.clone());
                info.name = Some(user.usual_full_name.clone());
                info.family_name = Some(user.last_name.clone());
                info.nickname = Some(user.username.clone());
                info.given_name = Some(user.given_name().to_string());
                info.locale = Some(DEFAULT_LOCALE.to_string());
                info.picture.clone_from(&user.picture);
            }
            _ => {}
        }
    }
    info
}

pub struct UserInfoProjector {
    store: CredentialStore,
}

impl UserInfoProjector {
    #[must_use]
    pub const fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Claims for `user_id` (the numeric subject) under `granted` scopes.
    pub async fn set_userinfo_from_scopes<S: AsRef<str> + Sync>(
        &self,
        user_id: &str,
        granted: &[S],
    ) -> Result<UserInfo> {
        let user = self.load_user(user_id).await?;
        Ok(project(&user, user_id, granted))
    }

    /// Claims for the holder of a live access token.
    pub async fn set_userinfo_from_token(&self, token_id: &str) -> Result<UserInfo> {
        let token = self.live_token(token_id).await?;
        self.set_userinfo_from_scopes(&token.subject, token.scopes.as_slice())
            .await
    }

    pub async fn set_introspection_from_token(
        &self,
        token_id: &str,
        subject: &str,
    ) -> Result<Introspection> {
        let token = self.live_token(token_id).await?;
        let userinfo = self
            .set_userinfo_from_scopes(subject, token.scopes.as_slice())
            .await?;
        Ok(Introspection {
            active: true,
            scope: token.scopes.into_inner(),
            client_id: token.application_id,
            sub: subject.to_string(),
            userinfo,
        })
    }

    async fn live_token(&self, token_id: &str) -> Result<entity::auth_tokens::Model> {
        let token = self
            .store
            .access_token(token_id)
            .await?
            .ok_or_else(|| IdentityError::access_denied("token not found"))?;
        if !token.is_active_at(Utc::now().naive_utc()) {
            return Err(IdentityError::access_denied("token expired"));
        }
        Ok(token)
    }

    async fn load_user(&self, user_id: &str) -> Result<users::Model> {
        let id: i32 = user_id
            .parse()
            .map_err(|_| IdentityError::access_denied("user not found"))?;
        self.store
            .user(id)
            .await?
            .ok_or_else(|| IdentityError::access_denied("user not found"))
    }
}

//! Per-user permission resolution.

use std::sync::Arc;

use super::engine::Rbac;
use super::model::Permission;
use crate::auth::CredentialStore;
use crate::error::{IdentityError, Result};

#[derive(Clone)]
pub struct RbacService {
    rbac: Arc<Rbac>,
    store: CredentialStore,
}

impl RbacService {
    #[must_use]
    pub const fn new(rbac: Arc<Rbac>, store: CredentialStore) -> Self {
        Self { rbac, store }
    }

    #[must_use]
    pub fn rbac(&self) -> &Rbac {
        &self.rbac
    }

    /// Role names stored on the user row. Unknown users are `Forbidden`.
    pub async fn roles_for_user(&self, user_id: i32) -> Result<Vec<String>> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| IdentityError::forbidden("user not found"))?;
        Ok(user.roles.into_inner())
    }

    pub async fn permissions_for_user(&self, user_id: i32) -> Result<Vec<Permission>> {
        let roles = self.roles_for_user(user_id).await?;
        Ok(self.rbac.get_permissions(roles.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{UserFixture, create_test_db, test_rbac};

    #[tokio::test]
    async fn test_permissions_follow_stored_roles() {
        let db = Arc::new(create_test_db().await.unwrap());
        let admin = UserFixture::new("root")
            .roles(&["admin"])
            .insert(db.as_ref())
            .await
            .unwrap();
        let service = RbacService::new(Arc::new(test_rbac()), CredentialStore::new(db));

        let perms = service.permissions_for_user(admin.id).await.unwrap();
        assert!(crate::rbac::check_permission(&perms, "/roles", "GET"));
        assert!(crate::rbac::check_permission(&perms, "/me", "GET"));
        assert_eq!(service.roles_for_user(admin.id).await.unwrap(), vec!["admin"]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_forbidden() {
        let db = Arc::new(create_test_db().await.unwrap());
        let service = RbacService::new(Arc::new(test_rbac()), CredentialStore::new(db));
        let err = service.permissions_for_user(404).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}

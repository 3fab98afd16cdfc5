//! Role document model and permission matching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Matches any path, or any method.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub path: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl Permission {
    pub fn new<I, S>(path: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str, method: &str) -> bool {
        self.matches_path(path)
            && self
                .methods
                .iter()
                .any(|allowed| allowed == WILDCARD || allowed == method)
    }

    /// Literal match, the global wildcard, or a `/`-segment template where
    /// each segment is literal or `*`. Segment counts must be equal, so
    /// `/tournaments/*` does not cover `/tournaments` nor `/tournaments/1/matches`.
    fn matches_path(&self, path: &str) -> bool {
        if self.path == path || self.path == WILDCARD {
            return true;
        }
        let template = self.path.split('/');
        let actual = path.split('/');
        if template.clone().count() != actual.clone().count() {
            return false;
        }
        template
            .zip(actual)
            .all(|(expected, segment)| expected == WILDCARD || expected == segment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Names (not keys) of the roles whose permissions this role also grants.
    #[serde(default)]
    pub inherits: Vec<String>,
}

impl Role {
    #[must_use]
    pub fn can(&self, path: &str, method: &str) -> bool {
        check_permission(&self.permissions, path, method)
    }
}

/// On-disk layout: roles keyed by the identity provider's role key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleDocument {
    #[serde(default)]
    pub roles: BTreeMap<String, Role>,
}

#[must_use]
pub fn check_permission(permissions: &[Permission], path: &str, method: &str) -> bool {
    permissions.iter().any(|p| p.matches(path, method))
}

/// Permissions resolved for the current request, placed in request
/// extensions by the permission middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestPermissions {
    pub permissions: Vec<Permission>,
}

impl RequestPermissions {
    #[must_use]
    pub fn can(&self, path: &str, method: &str) -> bool {
        check_permission(&self.permissions, path, method)
    }
}

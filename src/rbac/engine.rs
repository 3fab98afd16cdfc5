//! Role engine: loads the role document and answers permission questions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::model::{Permission, Role, RoleDocument, check_permission};
use crate::error::{Context, IdentityError, Result};

/// Immutable after load; shared behind an `Arc` and read without locking.
#[derive(Debug, Clone)]
pub struct Rbac {
    roles: BTreeMap<String, Role>,
    role_keys: HashMap<String, String>,
}

impl Rbac {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("无法打开角色定义文件: {}", path.display()))?;
        let rbac = Self::from_reader(file)?;
        info!(path = %path.display(), roles = rbac.roles.len(), "角色定义加载完成");
        Ok(rbac)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: RoleDocument = serde_yaml::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: RoleDocument = serde_yaml::from_str(content)?;
        Self::from_document(document)
    }

    /// Re-key roles by name, keeping the external key → name mapping, then
    /// reject inheritance cycles.
    pub fn from_document(document: RoleDocument) -> Result<Self> {
        let mut roles = BTreeMap::new();
        let mut role_keys = HashMap::new();
        for (key, role) in document.roles {
            if role.name.is_empty() {
                return Err(IdentityError::config(format!("角色 {key} 缺少 name")));
            }
            role_keys.insert(key, role.name.clone());
            if let Some(previous) = roles.insert(role.name.clone(), role) {
                return Err(IdentityError::config(format!(
                    "角色名重复: {}",
                    previous.name
                )));
            }
        }

        let rbac = Self { roles, role_keys };
        rbac.warn_unknown_parents();
        rbac.reject_cycles()?;
        Ok(rbac)
    }

    fn warn_unknown_parents(&self) {
        for role in self.roles.values() {
            for parent in &role.inherits {
                if !self.roles.contains_key(parent) {
                    warn!(role = %role.name, parent = %parent, "inherited role does not exist, ignoring");
                }
            }
        }
    }

    fn reject_cycles(&self) -> Result<()> {
        let mut done = HashSet::new();
        for name in self.roles.keys() {
            let mut path = Vec::new();
            self.visit(name, &mut path, &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|seen| *seen == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name);
            return Err(IdentityError::config(format!(
                "角色继承存在循环: {}",
                cycle.join(" -> ")
            )));
        }
        let Some(role) = self.roles.get(name) else {
            return Ok(());
        };
        path.push(name);
        for parent in &role.inherits {
            self.visit(parent, path, done)?;
        }
        path.pop();
        done.insert(name);
        Ok(())
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Map an identity-provider role key to the role name used internally.
    #[must_use]
    pub fn role_name_for_key(&self, key: &str) -> Option<&str> {
        self.role_keys.get(key).map(String::as_str)
    }

    /// Whether any of `role_names` (directly or through inheritance) grants
    /// `method` on `path`. Unknown role names grant nothing.
    #[must_use]
    pub fn can<S: AsRef<str>>(&self, role_names: &[S], path: &str, method: &str) -> bool {
        let allowed = check_permission(&self.get_permissions(role_names), path, method);
        if !allowed {
            debug!(path, method, "no role grants this route");
        }
        allowed
    }

    /// Own and inherited permissions of every named role, flattened.
    #[must_use]
    pub fn get_permissions<S: AsRef<str>>(&self, role_names: &[S]) -> Vec<Permission> {
        let mut visited = HashSet::new();
        let mut permissions = Vec::new();
        for name in role_names {
            self.collect(name.as_ref(), &mut visited, &mut permissions);
        }
        permissions
    }

    fn collect<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<Permission>,
    ) {
        let Some(role) = self.roles.get(name) else {
            return;
        };
        if !visited.insert(role.name.as_str()) {
            return;
        }
        out.extend(role.permissions.iter().cloned());
        for parent in &role.inherits {
            self.collect(parent, visited, out);
        }
    }

    /// All roles, ordered by name.
    #[must_use]
    pub fn list(&self) -> Vec<&Role> {
        self.roles.values().collect()
    }

    #[must_use]
    pub fn list_roles(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }
}

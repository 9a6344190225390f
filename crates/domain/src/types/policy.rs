//! Policy: binds a principal to a set of roles. Immutable after creation.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityMeta};
use super::ids::ScopeId;

/// Grants a principal the permissions of a set of roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Service account the policy grants roles to
    #[serde(default)]
    pub principal_id: String,
    /// Ordered set of role ids in the same permission system
    #[serde(default)]
    pub role_ids: Vec<String>,
}

impl Policy {
    /// Policy for `principal_id` with no roles yet.
    pub fn new(
        scope_id: impl Into<ScopeId>,
        name: impl Into<String>,
        principal_id: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(scope_id, name),
            principal_id: principal_id.into(),
            role_ids: Vec::new(),
        }
    }

    /// Add a role reference, ignoring duplicates.
    pub fn with_role(mut self, role_id: impl Into<String>) -> Self {
        let role_id = role_id.into();
        if !self.role_ids.contains(&role_id) {
            self.role_ids.push(role_id);
        }
        self
    }

    /// Same role ids regardless of order or duplicates.
    pub fn same_roles(&self, other: &[String]) -> bool {
        let mut mine: Vec<&str> = self.role_ids.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other.iter().map(String::as_str).collect();
        mine.sort_unstable();
        mine.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }

    /// Whether `role_id` is among the referenced roles.
    pub fn references_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|r| r == role_id)
    }
}

impl Entity for Policy {
    const KIND: &'static str = "policy";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn refresh_from(&mut self, remote: Self) {
        if !remote.principal_id.is_empty() && remote.principal_id != self.principal_id {
            self.principal_id = remote.principal_id;
        }
        if !self.same_roles(&remote.role_ids) {
            self.role_ids = remote.role_ids;
        }
        self.meta.refresh_from(remote.meta);
    }
}

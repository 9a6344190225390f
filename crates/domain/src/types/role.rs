//! Role: a named set of permissions within a permission system

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityMeta};
use super::ids::ScopeId;

/// Named set of permission expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Permission name to expression; expressions are opaque and may be empty.
    #[serde(default)]
    pub permissions: BTreeMap<String, String>,
}

impl Role {
    /// Role with no permissions.
    pub fn new(scope_id: impl Into<ScopeId>, name: impl Into<String>) -> Self {
        Self { meta: EntityMeta::new(scope_id, name), permissions: BTreeMap::new() }
    }

    /// Add or overwrite one permission; an empty expression means unconditional.
    pub fn with_permission(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.permissions.insert(name.into(), expression.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Same permission names with the same (whitespace-insensitive)
    /// expressions.
    pub fn permissions_equivalent(&self, other: &BTreeMap<String, String>) -> bool {
        self.permissions.len() == other.len()
            && self
                .permissions
                .iter()
                .all(|(name, expr)| other.get(name).is_some_and(|o| o.trim() == expr.trim()))
    }
}

impl Entity for Role {
    const KIND: &'static str = "role";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn refresh_from(&mut self, remote: Self) {
        if !self.permissions_equivalent(&remote.permissions) {
            self.permissions = remote.permissions;
        }
        self.meta.refresh_from(remote.meta);
    }
}

//! Permission system: the scope every other entity lives in

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityMeta};
use super::ids::ScopeId;

/// Top-level container; every other entity lives in one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSystem {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Server-reported system type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_type: Option<String>,
}

impl PermissionSystem {
    /// Scope identifier of this permission system.
    pub fn scope_id(&self) -> ScopeId {
        ScopeId::new(self.meta.id.clone())
    }
}

impl Entity for PermissionSystem {
    const KIND: &'static str = "permission system";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn refresh_from(&mut self, remote: Self) {
        if remote.system_type.is_some() {
            self.system_type = remote.system_type;
        }
        self.meta.refresh_from(remote.meta);
    }
}

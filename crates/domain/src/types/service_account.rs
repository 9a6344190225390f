//! Service account: a non-human principal that owns tokens

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityMeta};
use super::ids::ScopeId;

/// Non-human principal within a permission system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    #[serde(flatten)]
    pub meta: EntityMeta,
}

impl ServiceAccount {
    /// Service account not yet created.
    pub fn new(scope_id: impl Into<ScopeId>, name: impl Into<String>) -> Self {
        Self { meta: EntityMeta::new(scope_id, name) }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }
}

impl Entity for ServiceAccount {
    const KIND: &'static str = "service account";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn refresh_from(&mut self, remote: Self) {
        self.meta.refresh_from(remote.meta);
    }
}

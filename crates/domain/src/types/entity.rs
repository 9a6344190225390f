//! Shared entity skeleton and the `{payload, etag}` bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ETag, ScopeId};

/// Attributes every managed resource carries.
///
/// `id`, `created_at` and `creator` are computed once by the server and are
/// stable for the entity's lifetime. `etag`, `updated_at` and `updater`
/// change with every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    /// Owning permission system
    #[serde(rename = "permissionsSystemId", default)]
    pub scope_id: ScopeId,
    /// Server-assigned id; empty until created
    #[serde(default)]
    pub id: String,
    /// User-chosen display name
    #[serde(default)]
    pub name: String,
    /// Optional free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Server stamp set at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Principal that created the entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Server stamp of the last change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Principal behind the last change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updater: Option<String>,
    /// Version tag from the last response
    #[serde(rename = "configETag", default, skip_serializing_if = "ETag::is_empty")]
    pub etag: ETag,
}

impl EntityMeta {
    /// Metadata for an entity not yet created.
    pub fn new(scope_id: impl Into<ScopeId>, name: impl Into<String>) -> Self {
        Self { scope_id: scope_id.into(), name: name.into(), ..Self::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Absorb a server echo of this entity.
    ///
    /// Identity (`scope_id`, `id`) and the creation stamp keep their prior
    /// values when known. User-authored fields only change when the remote
    /// value differs semantically. Update stamps and the etag mirror the
    /// server.
    pub fn refresh_from(&mut self, remote: EntityMeta) {
        if self.scope_id.is_empty() {
            self.scope_id = remote.scope_id;
        }
        if self.id.is_empty() {
            self.id = remote.id;
        }
        if self.name.trim() != remote.name.trim() && !remote.name.trim().is_empty() {
            self.name = remote.name;
        }
        if normalized(self.description.as_deref()) != normalized(remote.description.as_deref()) {
            self.description = remote.description;
        }
        if self.created_at.is_none() {
            self.created_at = remote.created_at;
        }
        if self.creator.as_deref().map_or(true, str::is_empty) {
            self.creator = remote.creator;
        }
        self.updated_at = remote.updated_at;
        self.updater = remote.updater;
        self.etag = remote.etag.or(std::mem::take(&mut self.etag));
    }

    /// Drop every server-computed attribute before re-creating.
    pub fn forget_computed(&mut self) {
        self.id.clear();
        self.created_at = None;
        self.creator = None;
        self.updated_at = None;
        self.updater = None;
        self.etag = ETag::empty();
    }

    /// Stamp the computed attributes of a freshly created entity.
    pub fn stamp_created(&mut self, remote: &EntityMeta) {
        self.id = remote.id.clone();
        self.created_at = remote.created_at;
        self.creator = remote.creator.clone();
        self.updated_at = remote.updated_at;
        self.updater = remote.updater.clone();
        self.etag = remote.etag.clone();
    }
}

fn normalized(value: Option<&str>) -> &str {
    value.map_or("", str::trim)
}

/// Behaviour shared by every managed resource type.
pub trait Entity: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Human-readable type name used in diagnostics and log fields.
    const KIND: &'static str;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    fn scope(&self) -> &ScopeId {
        &self.meta().scope_id
    }

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn etag(&self) -> &ETag {
        &self.meta().etag
    }

    /// Absorb a server echo; see [`EntityMeta::refresh_from`].
    fn refresh_from(&mut self, remote: Self);
}

/// A decoded entity together with the version tag captured from the
/// response that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBundle<T> {
    /// Decoded entity
    pub payload: T,
    /// Tag taken from the response header or body
    pub etag: ETag,
}

impl<T: Entity> EntityBundle<T> {
    pub fn new(payload: T, etag: ETag) -> Self {
        Self { payload, etag }
    }

    /// The payload with the captured etag written into its metadata.
    pub fn into_entity(self) -> T {
        let mut payload = self.payload;
        payload.meta_mut().etag = self.etag;
        payload
    }
}

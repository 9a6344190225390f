//! Identity and version newtypes

use serde::{Deserialize, Serialize};

/// Identifier of a permission system, the unit of isolation and
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Wrap a raw permission system id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ScopeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ScopeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque server-minted version tag.
///
/// Compared by equality only; sent back verbatim as `If-Match`. An empty tag
/// means "unknown" and makes the entity client fetch the current one first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Wrap a tag exactly as the server sent it.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The unknown tag.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tag is unknown.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `self` unless empty, otherwise `fallback`.
    pub fn or(self, fallback: ETag) -> ETag {
        if self.is_empty() {
            fallback
        } else {
            self
        }
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ETag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ETag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

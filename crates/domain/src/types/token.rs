//! Token: a credential owned by a service account

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityMeta};
use super::ids::ScopeId;

/// Credential owned by a service account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Owning service account, in the same scope
    #[serde(default)]
    pub service_account_id: String,
    /// Server-computed fingerprint of the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Plain-text secret, present only in the creation response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Token {
    /// Token for `service_account_id`, not yet created.
    pub fn new(
        scope_id: impl Into<ScopeId>,
        service_account_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(scope_id, name),
            service_account_id: service_account_id.into(),
            hash: None,
            secret: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Whether the plain-text secret is known.
    pub fn has_secret(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl Entity for Token {
    const KIND: &'static str = "token";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    /// Reads never return the secret; the one captured at creation is kept.
    fn refresh_from(&mut self, remote: Self) {
        let Token { meta, service_account_id, hash, secret } = remote;
        if self.service_account_id.is_empty() {
            self.service_account_id = service_account_id;
        }
        if hash.as_deref().is_some_and(|h| !h.is_empty()) {
            self.hash = hash;
        }
        if !self.has_secret() && secret.as_deref().is_some_and(|s| !s.is_empty()) {
            self.secret = secret;
        }
        self.meta.refresh_from(meta);
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("meta", &self.meta)
            .field("service_account_id", &self.service_account_id)
            .field("hash", &self.hash)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_never_drops_the_creation_secret() {
        let mut local = Token::new("ps", "sa-1", "ci");
        local.secret = Some("s3cr3t".into());
        let mut remote = Token::new("ps", "sa-1", "ci");
        remote.hash = Some("abc".into());
        remote.secret = Some(String::new());

        local.refresh_from(remote);

        assert_eq!(local.secret.as_deref(), Some("s3cr3t"));
        assert_eq!(local.hash.as_deref(), Some("abc"));
    }

    #[test]
    fn refresh_adopts_remote_identity_and_secret_when_missing() {
        let mut local = Token::new("ps", "", "ci");
        let mut remote = Token::new("ps", "sa-9", "ci");
        remote.secret = Some("fresh".into());

        local.refresh_from(remote);

        assert_eq!(local.service_account_id, "sa-9");
        assert_eq!(local.secret.as_deref(), Some("fresh"));
        assert!(local.hash.is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let mut token = Token::new("ps", "sa-1", "ci");
        token.secret = Some("s3cr3t".into());
        assert!(!format!("{token:?}").contains("s3cr3t"));
    }
}

//! Request bodies
//!
//! Create and update bodies carry user-authored attributes only; server
//! fields (`id`, stamps, `configETag`, `hash`) never go on the wire.

use std::collections::BTreeMap;

use permsys_domain::{Entity, EntityBundle, Policy, Role, ScopeId, ServiceAccount, Token};
use serde::Serialize;

/// Role create body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    permissions: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a Role> for RoleBody<'a> {
    fn from(role: &'a Role) -> Self {
        Self {
            name: &role.meta.name,
            description: role.meta.description.as_deref(),
            permissions: &role.permissions,
        }
    }
}

/// Service account create and update body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a ServiceAccount> for ServiceAccountBody<'a> {
    fn from(account: &'a ServiceAccount) -> Self {
        Self { name: &account.meta.name, description: account.meta.description.as_deref() }
    }
}

/// Token create and update body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    /// Asks the server to include the one-shot secret in the response
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    return_plain_text: bool,
}

impl<'a> TokenBody<'a> {
    /// Create body; asks for the plain-text secret.
    pub fn create(token: &'a Token) -> Self {
        Self { return_plain_text: true, ..Self::update(token) }
    }

    /// Update body; the secret is never requested again.
    pub fn update(token: &'a Token) -> Self {
        Self {
            name: &token.meta.name,
            description: token.meta.description.as_deref(),
            return_plain_text: false,
        }
    }
}

/// Policy create body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    principal_id: &'a str,
    role_ids: &'a [String],
}

impl<'a> From<&'a Policy> for PolicyBody<'a> {
    fn from(policy: &'a Policy) -> Self {
        Self {
            name: &policy.meta.name,
            description: policy.meta.description.as_deref(),
            principal_id: &policy.principal_id,
            role_ids: &policy.role_ids,
        }
    }
}

/// Responses do not always echo the owning permission system; fill it in
/// from the request path.
pub fn in_scope<T: Entity>(mut entity: T, scope: &ScopeId) -> T {
    if entity.meta().scope_id.is_empty() {
        entity.meta_mut().scope_id = scope.clone();
    }
    entity
}

/// [`in_scope`] for a decoded bundle.
pub fn bundle_in_scope<T: Entity>(bundle: EntityBundle<T>, scope: &ScopeId) -> EntityBundle<T> {
    EntityBundle::new(in_scope(bundle.payload, scope), bundle.etag)
}

/// Tokens additionally inherit their service account from the path.
pub fn token_in_scope(mut token: Token, scope: &ScopeId, service_account_id: &str) -> Token {
    if token.service_account_id.is_empty() {
        token.service_account_id = service_account_id.to_string();
    }
    in_scope(token, scope)
}

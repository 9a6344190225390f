//! Plan-time helpers for the host
//!
//! `id`, `created_at` and `creator` are computed once by the server. When
//! the host's planned state leaves them unknown they are carried over from
//! prior state, so updates never show them as changes. `etag`, `updated_at`
//! and `updater` are never carried over; every mutation refreshes them.

use permsys_domain::{Entity, Policy, Role, ServiceAccount, Token};

/// Fill unknown computed attributes of `planned` from `prior`.
pub fn reuse_computed<E: Entity>(prior: &E, planned: &mut E) {
    let prior = prior.meta();
    let meta = planned.meta_mut();
    if meta.id.is_empty() {
        meta.id = prior.id.clone();
    }
    if meta.created_at.is_none() {
        meta.created_at = prior.created_at;
    }
    if meta.creator.as_deref().map_or(true, str::is_empty) {
        meta.creator = prior.creator.clone();
    }
}

/// Whether moving from `prior` to `planned` needs a new remote entity.
pub fn scope_changed<E: Entity>(prior: &E, planned: &E) -> bool {
    !planned.scope().is_empty() && prior.scope() != planned.scope()
}

/// Any user-authored role attribute differs.
pub fn role_changed(prior: &Role, planned: &Role) -> bool {
    prior.meta.name.trim() != planned.meta.name.trim()
        || normalized(&prior.meta.description) != normalized(&planned.meta.description)
        || !prior.permissions_equivalent(&planned.permissions)
        || scope_changed(prior, planned)
}

/// Any user-authored service account attribute differs.
pub fn service_account_changed(prior: &ServiceAccount, planned: &ServiceAccount) -> bool {
    prior.meta.name.trim() != planned.meta.name.trim()
        || normalized(&prior.meta.description) != normalized(&planned.meta.description)
}

/// Token metadata differs. Moving a token to another service account is
/// a replacement, see [`token_requires_replace`].
pub fn token_changed(prior: &Token, planned: &Token) -> bool {
    prior.meta.name.trim() != planned.meta.name.trim()
        || normalized(&prior.meta.description) != normalized(&planned.meta.description)
}

/// A token cannot move to another scope or service account.
pub fn token_requires_replace(prior: &Token, planned: &Token) -> bool {
    scope_changed(prior, planned) || prior.service_account_id != planned.service_account_id
}

/// Policies are immutable: any attribute change means destroy-then-create.
pub fn policy_requires_replace(prior: &Policy, planned: &Policy) -> bool {
    scope_changed(prior, planned)
        || prior.meta.name.trim() != planned.meta.name.trim()
        || normalized(&prior.meta.description) != normalized(&planned.meta.description)
        || prior.principal_id != planned.principal_id
        || !prior.same_roles(&planned.role_ids)
}

fn normalized(value: &Option<String>) -> &str {
    value.as_deref().map_or("", str::trim)
}

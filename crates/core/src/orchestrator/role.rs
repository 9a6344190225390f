//! Role orchestration
//!
//! The remote API has no PUT that matches a user's edit of a role, so an
//! update is a delete under the delete lane followed by a create under the
//! create lane. The role gets a new id. Because policies reference roles by
//! id, the edit is refused while any policy in the scope references the
//! role.

use std::sync::Arc;

use async_trait::async_trait;
use permsys_common::OperationContext;
use permsys_domain::{ApiResult, Diagnostics, Entity, Lifecycle, Role, ScopeId};
use tracing::{info, instrument};

use super::{record, refuse, transition, Coordinator, ResourceOrchestrator};
use crate::plan;
use crate::ports::{PolicyApi, RoleApi};
use crate::validation::Validate;

/// Lifecycle of roles.
pub struct RoleOrchestrator {
    roles: Arc<dyn RoleApi>,
    policies: Arc<dyn PolicyApi>,
    coordinator: Coordinator,
}

impl RoleOrchestrator {
    pub fn new(
        roles: Arc<dyn RoleApi>,
        policies: Arc<dyn PolicyApi>,
        coordinator: Coordinator,
    ) -> Self {
        Self { roles, policies, coordinator }
    }

    /// Every role in `scope`.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        scope: &ScopeId,
        diags: &mut Diagnostics,
    ) -> ApiResult<Vec<Role>> {
        let roles = self.coordinator.read(ctx, diags, "list roles", self.roles.list_roles(scope)).await?;
        Ok(roles.unwrap_or_default())
    }

    async fn create_stamped(
        &self,
        ctx: &OperationContext,
        mut planned: Role,
        diags: &mut Diagnostics,
    ) -> ApiResult<Role> {
        let scope = planned.scope().clone();
        transition(Role::KIND, &planned.meta.name, Lifecycle::Absent, Lifecycle::Creating);

        let request = planned.clone();
        let created = self
            .coordinator
            .create(ctx, diags, "create role", &scope, || self.roles.create_role(&request))
            .await;
        let created = match created {
            Ok(bundle) => bundle.into_entity(),
            Err(err) => {
                transition(
                    Role::KIND,
                    &planned.meta.name,
                    Lifecycle::Creating,
                    Lifecycle::Creating.on_failure(),
                );
                return Err(err);
            }
        };

        planned.meta.stamp_created(&created.meta);
        transition(Role::KIND, planned.id(), Lifecycle::Creating, Lifecycle::Present);

        let id = planned.id().to_string();
        self.coordinator
            .confirm_created(ctx, diags, &format!("role {id}"), || async {
                self.roles.get_role(&scope, &id).await.map(|_| true)
            })
            .await;
        Ok(planned)
    }

    /// Ids of policies in the role's scope that reference it.
    async fn referencing_policies(
        &self,
        ctx: &OperationContext,
        role: &Role,
        diags: &mut Diagnostics,
    ) -> ApiResult<Vec<String>> {
        let policies = self
            .coordinator
            .read(ctx, diags, "list policies", self.policies.list_policies(role.scope()))
            .await?
            .unwrap_or_default();
        Ok(policies
            .into_iter()
            .filter(|policy| policy.references_role(role.id()))
            .map(|policy| policy.meta.id)
            .collect())
    }
}

#[async_trait]
impl ResourceOrchestrator for RoleOrchestrator {
    type Entity = Role;

    #[instrument(skip_all, fields(scope = %planned.meta.scope_id, name = %planned.meta.name))]
    async fn create(
        &self,
        ctx: &OperationContext,
        planned: Role,
        diags: &mut Diagnostics,
    ) -> ApiResult<Role> {
        record(diags, "create role", planned.validate())?;
        self.create_stamped(ctx, planned, diags).await
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn read(
        &self,
        ctx: &OperationContext,
        mut state: Role,
        diags: &mut Diagnostics,
    ) -> ApiResult<Option<Role>> {
        record(diags, "read role", state.validate_stored())?;
        let remote = self
            .coordinator
            .read(ctx, diags, "read role", self.roles.get_role(state.scope(), state.id()))
            .await?;
        Ok(remote.map(|bundle| {
            state.refresh_from(bundle.into_entity());
            state
        }))
    }

    #[instrument(skip_all, fields(scope = %prior.meta.scope_id, id = %prior.meta.id))]
    async fn update(
        &self,
        ctx: &OperationContext,
        prior: Role,
        mut planned: Role,
        diags: &mut Diagnostics,
    ) -> ApiResult<Role> {
        plan::reuse_computed(&prior, &mut planned);
        record(diags, "update role", prior.validate_stored())?;
        record(diags, "update role", planned.validate())?;

        if !plan::role_changed(&prior, &planned) {
            return Ok(prior);
        }

        let referencing = self.referencing_policies(ctx, &prior, diags).await?;
        if !referencing.is_empty() {
            return refuse(
                diags,
                "update role",
                format!(
                    "role {} is referenced by policies [{}]; recreating it would leave them \
                     pointing at a deleted role. Remove or replace those policies first",
                    prior.id(),
                    referencing.join(", ")
                ),
            );
        }

        info!(old_id = prior.id(), "recreating role to apply update");
        transition(Role::KIND, prior.id(), Lifecycle::Present, Lifecycle::Updating);
        let deleted = self
            .coordinator
            .delete(ctx, diags, "delete role", prior.scope(), || {
                self.roles.delete_role(prior.scope(), prior.id())
            })
            .await;
        if let Err(err) = deleted {
            transition(
                Role::KIND,
                prior.id(),
                Lifecycle::Updating,
                Lifecycle::Updating.on_failure(),
            );
            return Err(err);
        }

        planned.meta.forget_computed();
        let recreated = self.create_stamped(ctx, planned, diags).await;
        if recreated.is_err() {
            diags.warning(
                format!("role {} was deleted but not recreated", prior.id()),
                "the role is now absent; the next apply creates it again",
            );
        }
        recreated
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn delete(
        &self,
        ctx: &OperationContext,
        state: &Role,
        diags: &mut Diagnostics,
    ) -> ApiResult<()> {
        record(diags, "delete role", state.validate_stored())?;
        transition(Role::KIND, state.id(), Lifecycle::Present, Lifecycle::Deleting);
        let result = self
            .coordinator
            .delete(ctx, diags, "delete role", state.scope(), || {
                self.roles.delete_role(state.scope(), state.id())
            })
            .await;
        let next =
            if result.is_ok() { Lifecycle::Absent } else { Lifecycle::Deleting.on_failure() };
        transition(Role::KIND, state.id(), Lifecycle::Deleting, next);
        result
    }
}

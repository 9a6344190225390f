//! Policy orchestration
//!
//! A policy create waits for its principal and every referenced role to be
//! readable. Policies are immutable: `update` is refused, and
//! [`PolicyOrchestrator::replace`] performs destroy-then-create through the
//! delete lane and then the create lane.

use std::sync::Arc;

use async_trait::async_trait;
use permsys_common::OperationContext;
use permsys_domain::{ApiResult, Diagnostics, Entity, Lifecycle, Policy, ScopeId};
use tracing::{info, instrument};

use super::{record, refuse, transition, Coordinator, ResourceOrchestrator};
use crate::existence::{ExistenceProbe, RoleProbe, ServiceAccountProbe};
use crate::plan;
use crate::ports::{PolicyApi, RoleApi, ServiceAccountApi};
use crate::validation::Validate;

/// Lifecycle of policies binding a principal to roles.
pub struct PolicyOrchestrator {
    policies: Arc<dyn PolicyApi>,
    accounts: Arc<dyn ServiceAccountApi>,
    roles: Arc<dyn RoleApi>,
    coordinator: Coordinator,
}

impl PolicyOrchestrator {
    pub fn new(
        policies: Arc<dyn PolicyApi>,
        accounts: Arc<dyn ServiceAccountApi>,
        roles: Arc<dyn RoleApi>,
        coordinator: Coordinator,
    ) -> Self {
        Self { policies, accounts, roles, coordinator }
    }

    /// Every policy in `scope`.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        scope: &ScopeId,
        diags: &mut Diagnostics,
    ) -> ApiResult<Vec<Policy>> {
        let policies = self
            .coordinator
            .read(ctx, diags, "list policies", self.policies.list_policies(scope))
            .await?;
        Ok(policies.unwrap_or_default())
    }

    /// Delete `prior`, then create `planned`.
    ///
    /// If the create fails the policy is left absent; there is no rollback.
    #[instrument(skip_all, fields(scope = %prior.meta.scope_id, id = %prior.meta.id))]
    pub async fn replace(
        &self,
        ctx: &OperationContext,
        prior: &Policy,
        mut planned: Policy,
        diags: &mut Diagnostics,
    ) -> ApiResult<Policy> {
        record(diags, "replace policy", planned.validate())?;
        info!(old_id = prior.id(), "replacing policy");
        self.delete(ctx, prior, diags).await?;

        planned.meta.forget_computed();
        self.create(ctx, planned, diags).await
    }

    fn parent_probes(&self, planned: &Policy) -> Vec<Box<dyn ExistenceProbe>> {
        let scope = planned.scope();
        let mut probes: Vec<Box<dyn ExistenceProbe>> = vec![Box::new(ServiceAccountProbe::new(
            Arc::clone(&self.accounts),
            scope.clone(),
            planned.principal_id.clone(),
        ))];
        for role_id in &planned.role_ids {
            probes.push(Box::new(RoleProbe::new(Arc::clone(&self.roles), scope.clone(), role_id.clone())));
        }
        probes
    }
}

#[async_trait]
impl ResourceOrchestrator for PolicyOrchestrator {
    type Entity = Policy;

    #[instrument(
        skip_all,
        fields(scope = %planned.meta.scope_id, name = %planned.meta.name, principal = %planned.principal_id)
    )]
    async fn create(
        &self,
        ctx: &OperationContext,
        mut planned: Policy,
        diags: &mut Diagnostics,
    ) -> ApiResult<Policy> {
        record(diags, "create policy", planned.validate())?;
        let scope = planned.scope().clone();

        let parents = self.parent_probes(&planned);
        self.coordinator.wait_for_parents(ctx, diags, "create policy", &parents).await?;

        transition(Policy::KIND, &planned.meta.name, Lifecycle::Absent, Lifecycle::Creating);
        let request = planned.clone();
        let created = self
            .coordinator
            .create(ctx, diags, "create policy", &scope, || self.policies.create_policy(&request))
            .await;
        let created = match created {
            Ok(bundle) => bundle.into_entity(),
            Err(err) => {
                transition(
                    Policy::KIND,
                    &planned.meta.name,
                    Lifecycle::Creating,
                    Lifecycle::Creating.on_failure(),
                );
                return Err(err);
            }
        };

        planned.meta.stamp_created(&created.meta);
        transition(Policy::KIND, planned.id(), Lifecycle::Creating, Lifecycle::Present);

        let id = planned.id().to_string();
        self.coordinator
            .confirm_created(ctx, diags, &format!("policy {id}"), || async {
                self.policies.get_policy(&scope, &id).await.map(|_| true)
            })
            .await;
        Ok(planned)
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn read(
        &self,
        ctx: &OperationContext,
        mut state: Policy,
        diags: &mut Diagnostics,
    ) -> ApiResult<Option<Policy>> {
        record(diags, "read policy", state.validate_stored())?;
        let remote = self
            .coordinator
            .read(ctx, diags, "read policy", self.policies.get_policy(state.scope(), state.id()))
            .await?;
        Ok(remote.map(|bundle| {
            state.refresh_from(bundle.into_entity());
            state
        }))
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        prior: Policy,
        mut planned: Policy,
        diags: &mut Diagnostics,
    ) -> ApiResult<Policy> {
        plan::reuse_computed(&prior, &mut planned);
        if !plan::policy_requires_replace(&prior, &planned) {
            return Ok(prior);
        }
        refuse(
            diags,
            "update policy",
            format!(
                "policy {} is immutable; destroy it and create a new one to change it",
                prior.id()
            ),
        )
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn delete(
        &self,
        ctx: &OperationContext,
        state: &Policy,
        diags: &mut Diagnostics,
    ) -> ApiResult<()> {
        record(diags, "delete policy", state.validate_stored())?;
        transition(Policy::KIND, state.id(), Lifecycle::Present, Lifecycle::Deleting);
        let result = self
            .coordinator
            .delete(ctx, diags, "delete policy", state.scope(), || {
                self.policies.delete_policy(state.scope(), state.id())
            })
            .await;
        let next =
            if result.is_ok() { Lifecycle::Absent } else { Lifecycle::Deleting.on_failure() };
        transition(Policy::KIND, state.id(), Lifecycle::Deleting, next);
        result
    }
}

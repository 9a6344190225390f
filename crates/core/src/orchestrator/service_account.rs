//! Service account orchestration
//!
//! Updates are etag-guarded PUTs. Deleting a service account first deletes
//! any tokens it still owns, all under one hold of the scope's delete lane.

use std::sync::Arc;

use async_trait::async_trait;
use permsys_common::{LaneKind, OperationContext};
use permsys_domain::{ApiResult, Diagnostics, ETag, Entity, Lifecycle, ScopeId, ServiceAccount};
use tracing::{debug, instrument};

use super::{record, refuse, transition, Coordinator, ResourceOrchestrator};
use crate::plan;
use crate::ports::{ServiceAccountApi, TokenApi};
use crate::validation::Validate;

/// Lifecycle of service accounts and the tokens they own.
pub struct ServiceAccountOrchestrator {
    accounts: Arc<dyn ServiceAccountApi>,
    tokens: Arc<dyn TokenApi>,
    coordinator: Coordinator,
}

impl ServiceAccountOrchestrator {
    pub fn new(
        accounts: Arc<dyn ServiceAccountApi>,
        tokens: Arc<dyn TokenApi>,
        coordinator: Coordinator,
    ) -> Self {
        Self { accounts, tokens, coordinator }
    }

    /// Every service account in `scope`.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        scope: &ScopeId,
        diags: &mut Diagnostics,
    ) -> ApiResult<Vec<ServiceAccount>> {
        let accounts = self
            .coordinator
            .read(ctx, diags, "list service accounts", self.accounts.list_service_accounts(scope))
            .await?;
        Ok(accounts.unwrap_or_default())
    }
}

#[async_trait]
impl ResourceOrchestrator for ServiceAccountOrchestrator {
    type Entity = ServiceAccount;

    #[instrument(skip_all, fields(scope = %planned.meta.scope_id, name = %planned.meta.name))]
    async fn create(
        &self,
        ctx: &OperationContext,
        mut planned: ServiceAccount,
        diags: &mut Diagnostics,
    ) -> ApiResult<ServiceAccount> {
        record(diags, "create service account", planned.validate())?;
        let scope = planned.scope().clone();
        transition(
            ServiceAccount::KIND,
            &planned.meta.name,
            Lifecycle::Absent,
            Lifecycle::Creating,
        );

        let request = planned.clone();
        let created = self
            .coordinator
            .create(ctx, diags, "create service account", &scope, || {
                self.accounts.create_service_account(&request)
            })
            .await;
        let created = match created {
            Ok(bundle) => bundle.into_entity(),
            Err(err) => {
                transition(
                    ServiceAccount::KIND,
                    &planned.meta.name,
                    Lifecycle::Creating,
                    Lifecycle::Creating.on_failure(),
                );
                return Err(err);
            }
        };

        planned.meta.stamp_created(&created.meta);
        transition(ServiceAccount::KIND, planned.id(), Lifecycle::Creating, Lifecycle::Present);

        let id = planned.id().to_string();
        self.coordinator
            .confirm_created(ctx, diags, &format!("service account {id}"), || async {
                self.accounts.get_service_account(&scope, &id).await.map(|_| true)
            })
            .await;
        Ok(planned)
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn read(
        &self,
        ctx: &OperationContext,
        mut state: ServiceAccount,
        diags: &mut Diagnostics,
    ) -> ApiResult<Option<ServiceAccount>> {
        record(diags, "read service account", state.validate_stored())?;
        let remote = self
            .coordinator
            .read(
                ctx,
                diags,
                "read service account",
                self.accounts.get_service_account(state.scope(), state.id()),
            )
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
        prior: ServiceAccount,
        mut planned: ServiceAccount,
        diags: &mut Diagnostics,
    ) -> ApiResult<ServiceAccount> {
        plan::reuse_computed(&prior, &mut planned);
        record(diags, "update service account", prior.validate_stored())?;
        record(diags, "update service account", planned.validate())?;
        if plan::scope_changed(&prior, &planned) {
            return refuse(
                diags,
                "update service account",
                "moving a service account to another permission system requires replacement".into(),
            );
        }
        if !plan::service_account_changed(&prior, &planned) {
            return Ok(prior);
        }

        transition(ServiceAccount::KIND, prior.id(), Lifecycle::Present, Lifecycle::Updating);
        let scope = prior.scope().clone();
        let id = prior.id().to_string();
        let request = planned.clone();
        let accounts = &self.accounts;

        let updated = self
            .coordinator
            .update(
                ctx,
                diags,
                "update service account",
                &scope,
                prior.etag().clone(),
                || async { accounts.get_service_account(&scope, &id).await.map(|b| b.etag) },
                |etag: ETag| {
                    let request = &request;
                    async move { accounts.update_service_account(request, &etag).await }
                },
            )
            .await;

        match updated {
            Ok(bundle) => {
                planned.refresh_from(bundle.into_entity());
                transition(
                    ServiceAccount::KIND,
                    planned.id(),
                    Lifecycle::Updating,
                    Lifecycle::Present,
                );
                Ok(planned)
            }
            Err(err) => {
                transition(
                    ServiceAccount::KIND,
                    prior.id(),
                    Lifecycle::Updating,
                    Lifecycle::Updating.on_failure(),
                );
                Err(err)
            }
        }
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn delete(
        &self,
        ctx: &OperationContext,
        state: &ServiceAccount,
        diags: &mut Diagnostics,
    ) -> ApiResult<()> {
        record(diags, "delete service account", state.validate_stored())?;
        let scope = state.scope();
        let id = state.id();
        transition(ServiceAccount::KIND, id, Lifecycle::Present, Lifecycle::Deleting);

        let permit = self
            .coordinator
            .acquire(LaneKind::Delete, scope, ctx, "delete service account")
            .await;
        let _permit = record(diags, "delete service account", permit)?;

        let owned = self
            .coordinator
            .read(ctx, diags, "list tokens", self.tokens.list_tokens(scope, id))
            .await?
            .unwrap_or_default();
        for token in &owned {
            debug!(token = %token.meta.id, "deleting token owned by service account");
            self.coordinator
                .delete_held(ctx, diags, "delete token", || {
                    self.tokens.delete_token(scope, id, &token.meta.id)
                })
                .await?;
        }

        let result = self
            .coordinator
            .delete_held(ctx, diags, "delete service account", || {
                self.accounts.delete_service_account(scope, id)
            })
            .await;
        let next =
            if result.is_ok() { Lifecycle::Absent } else { Lifecycle::Deleting.on_failure() };
        transition(ServiceAccount::KIND, id, Lifecycle::Deleting, next);
        result
    }
}

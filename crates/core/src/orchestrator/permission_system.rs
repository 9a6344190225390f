//! Permission systems are read-only from the provider's side.

use std::sync::Arc;

use permsys_common::OperationContext;
use permsys_domain::{ApiResult, Diagnostics, PermissionSystem, ScopeId};
use tracing::instrument;

use super::Coordinator;
use crate::existence::PermissionSystemProbe;
use crate::interrupt::cancelled;
use crate::ports::PermissionSystemApi;

/// Read-only access to permission systems.
pub struct PermissionSystemOrchestrator {
    api: Arc<dyn PermissionSystemApi>,
    coordinator: Coordinator,
}

impl PermissionSystemOrchestrator {
    pub fn new(api: Arc<dyn PermissionSystemApi>, coordinator: Coordinator) -> Self {
        Self { api, coordinator }
    }

    /// Every permission system visible to the token.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
    ) -> ApiResult<Vec<PermissionSystem>> {
        let systems = self
            .coordinator
            .read(ctx, diags, "list permission systems", self.api.list_permission_systems())
            .await?;
        Ok(systems.unwrap_or_default())
    }

    /// The permission system, or `None` when it does not exist.
    #[instrument(skip(self, ctx, diags))]
    pub async fn read(
        &self,
        ctx: &OperationContext,
        scope: &ScopeId,
        diags: &mut Diagnostics,
    ) -> ApiResult<Option<PermissionSystem>> {
        let remote = self
            .coordinator
            .read(ctx, diags, "read permission system", self.api.get_permission_system(scope))
            .await?;
        Ok(remote.map(|bundle| bundle.into_entity()))
    }

    /// Block until the permission system is readable.
    pub async fn wait_visible(&self, ctx: &OperationContext, scope: &ScopeId) -> ApiResult<()> {
        ctx.check().map_err(|reason| cancelled("wait for permission system", reason))?;
        let probe = PermissionSystemProbe::new(Arc::clone(&self.api), scope.clone());
        self.coordinator.waiter().wait_exists(ctx, &probe).await
    }
}

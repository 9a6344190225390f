//! Permission system client (read-only)

use async_trait::async_trait;
use permsys_core::PermissionSystemApi;
use permsys_domain::{ApiResult, EntityBundle, PermissionSystem, ScopeId};
use tracing::instrument;

use super::client::ApiClient;
use super::paths;

/// [`PermissionSystemApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct PermissionSystemClient {
    api: ApiClient,
}

impl PermissionSystemClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PermissionSystemApi for PermissionSystemClient {
    #[instrument(skip(self))]
    async fn list_permission_systems(&self) -> ApiResult<Vec<PermissionSystem>> {
        self.api.list(&paths::permission_systems()).await
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_permission_system(
        &self,
        scope: &ScopeId,
    ) -> ApiResult<EntityBundle<PermissionSystem>> {
        self.api.get(&paths::permission_system(scope)).await
    }
}

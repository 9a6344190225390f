//! Role entity client

use async_trait::async_trait;
use permsys_core::RoleApi;
use permsys_domain::{ApiResult, ETag, Entity, EntityBundle, Role, ScopeId};
use tracing::instrument;

use super::client::ApiClient;
use super::paths;
use super::wire::{bundle_in_scope, in_scope, RoleBody};

/// [`RoleApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct RoleClient {
    api: ApiClient,
}

impl RoleClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RoleApi for RoleClient {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn list_roles(&self, scope: &ScopeId) -> ApiResult<Vec<Role>> {
        let roles: Vec<Role> = self.api.list(&paths::roles(scope)).await?;
        Ok(roles.into_iter().map(|role| in_scope(role, scope)).collect())
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_role(&self, scope: &ScopeId, id: &str) -> ApiResult<EntityBundle<Role>> {
        let bundle = self.api.get(&paths::role(scope, id)).await?;
        Ok(bundle_in_scope(bundle, scope))
    }

    #[instrument(skip_all, fields(scope = %role.meta.scope_id, name = %role.meta.name))]
    async fn create_role(&self, role: &Role) -> ApiResult<EntityBundle<Role>> {
        let bundle =
            self.api.create(&paths::roles(role.scope()), &RoleBody::from(role)).await?;
        Ok(bundle_in_scope(bundle, role.scope()))
    }

    #[instrument(skip_all, fields(scope = %role.meta.scope_id, id = %role.meta.id))]
    async fn update_role(&self, role: &Role, etag: &ETag) -> ApiResult<EntityBundle<Role>> {
        let path = paths::role(role.scope(), role.id());
        let bundle = self.api.update(&path, &RoleBody::from(role), etag).await?;
        Ok(bundle_in_scope(bundle, role.scope()))
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete_role(&self, scope: &ScopeId, id: &str) -> ApiResult<()> {
        self.api.delete(&paths::role(scope, id)).await
    }
}

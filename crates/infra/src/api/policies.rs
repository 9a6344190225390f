//! Policy entity client. Policies are immutable; there is no PUT.

use async_trait::async_trait;
use permsys_core::PolicyApi;
use permsys_domain::{ApiResult, Entity, EntityBundle, Policy, ScopeId};
use tracing::instrument;

use super::client::ApiClient;
use super::paths;
use super::wire::{bundle_in_scope, in_scope, PolicyBody};

/// [`PolicyApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct PolicyClient {
    api: ApiClient,
}

impl PolicyClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PolicyApi for PolicyClient {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn list_policies(&self, scope: &ScopeId) -> ApiResult<Vec<Policy>> {
        let policies: Vec<Policy> = self.api.list(&paths::policies(scope)).await?;
        Ok(policies.into_iter().map(|policy| in_scope(policy, scope)).collect())
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_policy(&self, scope: &ScopeId, id: &str) -> ApiResult<EntityBundle<Policy>> {
        let bundle = self.api.get(&paths::policy(scope, id)).await?;
        Ok(bundle_in_scope(bundle, scope))
    }

    #[instrument(skip_all, fields(scope = %policy.meta.scope_id, name = %policy.meta.name))]
    async fn create_policy(&self, policy: &Policy) -> ApiResult<EntityBundle<Policy>> {
        let path = paths::policies(policy.scope());
        let bundle = self.api.create(&path, &PolicyBody::from(policy)).await?;
        Ok(bundle_in_scope(bundle, policy.scope()))
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete_policy(&self, scope: &ScopeId, id: &str) -> ApiResult<()> {
        self.api.delete(&paths::policy(scope, id)).await
    }
}

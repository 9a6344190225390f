//! Service account entity client

use async_trait::async_trait;
use permsys_core::ServiceAccountApi;
use permsys_domain::{ApiResult, ETag, Entity, EntityBundle, ScopeId, ServiceAccount};
use tracing::instrument;

use super::client::ApiClient;
use super::paths;
use super::wire::{bundle_in_scope, in_scope, ServiceAccountBody};

/// [`ServiceAccountApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct ServiceAccountClient {
    api: ApiClient,
}

impl ServiceAccountClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ServiceAccountApi for ServiceAccountClient {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn list_service_accounts(&self, scope: &ScopeId) -> ApiResult<Vec<ServiceAccount>> {
        let accounts: Vec<ServiceAccount> = self.api.list(&paths::service_accounts(scope)).await?;
        Ok(accounts.into_iter().map(|account| in_scope(account, scope)).collect())
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_service_account(
        &self,
        scope: &ScopeId,
        id: &str,
    ) -> ApiResult<EntityBundle<ServiceAccount>> {
        let bundle = self.api.get(&paths::service_account(scope, id)).await?;
        Ok(bundle_in_scope(bundle, scope))
    }

    #[instrument(skip_all, fields(scope = %account.meta.scope_id, name = %account.meta.name))]
    async fn create_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ApiResult<EntityBundle<ServiceAccount>> {
        let path = paths::service_accounts(account.scope());
        let bundle = self.api.create(&path, &ServiceAccountBody::from(account)).await?;
        Ok(bundle_in_scope(bundle, account.scope()))
    }

    #[instrument(skip_all, fields(scope = %account.meta.scope_id, id = %account.meta.id))]
    async fn update_service_account(
        &self,
        account: &ServiceAccount,
        etag: &ETag,
    ) -> ApiResult<EntityBundle<ServiceAccount>> {
        let path = paths::service_account(account.scope(), account.id());
        let bundle = self.api.update(&path, &ServiceAccountBody::from(account), etag).await?;
        Ok(bundle_in_scope(bundle, account.scope()))
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete_service_account(&self, scope: &ScopeId, id: &str) -> ApiResult<()> {
        self.api.delete(&paths::service_account(scope, id)).await
    }
}

//! Port interfaces for the remote control-plane API
//!
//! These traits define the boundary between orchestration logic and the
//! HTTP entity clients in `permsys-infra`. Implementations must:
//! - return the etag captured from the response alongside every `get`,
//!   `create` and `update` payload
//! - send `If-Match` on `update`, fetching the current etag first when the
//!   supplied one is empty
//! - treat 404 on `delete` as success
//!
//! Ports are context-free. Orchestrators race every call against the
//! caller's cancellation token and deadline.

use async_trait::async_trait;
use permsys_domain::{
    ApiResult, ETag, EntityBundle, PermissionSystem, Policy, Role, ScopeId, ServiceAccount, Token,
};

/// Read access to permission systems (scopes)
#[async_trait]
pub trait PermissionSystemApi: Send + Sync {
    async fn list_permission_systems(&self) -> ApiResult<Vec<PermissionSystem>>;

    async fn get_permission_system(
        &self,
        scope: &ScopeId,
    ) -> ApiResult<EntityBundle<PermissionSystem>>;
}

/// Role CRUD
#[async_trait]
pub trait RoleApi: Send + Sync {
    async fn list_roles(&self, scope: &ScopeId) -> ApiResult<Vec<Role>>;

    async fn get_role(&self, scope: &ScopeId, id: &str) -> ApiResult<EntityBundle<Role>>;

    async fn create_role(&self, role: &Role) -> ApiResult<EntityBundle<Role>>;

    async fn update_role(&self, role: &Role, etag: &ETag) -> ApiResult<EntityBundle<Role>>;

    async fn delete_role(&self, scope: &ScopeId, id: &str) -> ApiResult<()>;
}

/// Service account CRUD
#[async_trait]
pub trait ServiceAccountApi: Send + Sync {
    async fn list_service_accounts(&self, scope: &ScopeId) -> ApiResult<Vec<ServiceAccount>>;

    async fn get_service_account(
        &self,
        scope: &ScopeId,
        id: &str,
    ) -> ApiResult<EntityBundle<ServiceAccount>>;

    async fn create_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ApiResult<EntityBundle<ServiceAccount>>;

    async fn update_service_account(
        &self,
        account: &ServiceAccount,
        etag: &ETag,
    ) -> ApiResult<EntityBundle<ServiceAccount>>;

    async fn delete_service_account(&self, scope: &ScopeId, id: &str) -> ApiResult<()>;
}

/// Token CRUD, nested under a service account
#[async_trait]
pub trait TokenApi: Send + Sync {
    async fn list_tokens(
        &self,
        scope: &ScopeId,
        service_account_id: &str,
    ) -> ApiResult<Vec<Token>>;

    async fn get_token(
        &self,
        scope: &ScopeId,
        service_account_id: &str,
        id: &str,
    ) -> ApiResult<EntityBundle<Token>>;

    /// Create a token. The returned payload carries the one-shot secret.
    async fn create_token(&self, token: &Token) -> ApiResult<EntityBundle<Token>>;

    async fn update_token(&self, token: &Token, etag: &ETag) -> ApiResult<EntityBundle<Token>>;

    async fn delete_token(
        &self,
        scope: &ScopeId,
        service_account_id: &str,
        id: &str,
    ) -> ApiResult<()>;
}

/// Policy create/read/delete. Policies have no update.
#[async_trait]
pub trait PolicyApi: Send + Sync {
    async fn list_policies(&self, scope: &ScopeId) -> ApiResult<Vec<Policy>>;

    async fn get_policy(&self, scope: &ScopeId, id: &str) -> ApiResult<EntityBundle<Policy>>;

    async fn create_policy(&self, policy: &Policy) -> ApiResult<EntityBundle<Policy>>;

    async fn delete_policy(&self, scope: &ScopeId, id: &str) -> ApiResult<()>;
}

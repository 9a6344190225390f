//! Provider composition root
//!
//! Wires the HTTP transport, the entity clients, the lane registry and the
//! orchestrators together from a [`ProviderConfig`]. A plugin host builds
//! one `Provider` per configured provider block and calls the
//! orchestrators from as many workers as it likes.

use std::sync::Arc;

use permsys_common::ScopeLanes;
use permsys_core::{
    Coordinator, PermissionSystemOrchestrator, PolicyOrchestrator, RetryPolicies,
    RoleOrchestrator, ServiceAccountOrchestrator, TokenOrchestrator,
};
use permsys_domain::{ApiResult, ProviderConfig};
use tracing::info;

use crate::api::{
    ApiClient, PermissionSystemClient, PolicyClient, RoleClient, ServiceAccountClient, TokenClient,
};
use crate::http::HttpClient;

/// One orchestrator per entity kind, sharing a coordinator.
pub struct Provider {
    config: ProviderConfig,
    coordinator: Coordinator,
    pub permission_systems: PermissionSystemOrchestrator,
    pub roles: RoleOrchestrator,
    pub service_accounts: ServiceAccountOrchestrator,
    pub tokens: TokenOrchestrator,
    pub policies: PolicyOrchestrator,
}

impl Provider {
    /// Provider on the process-wide lane registry.
    ///
    /// # Errors
    /// Returns `Fatal` when the configuration is invalid.
    pub fn new(config: ProviderConfig) -> ApiResult<Self> {
        Self::with_coordinator(config, Coordinator::global())
    }

    /// Provider on a private lane registry, isolated from other providers
    /// in the process.
    pub fn isolated(config: ProviderConfig) -> ApiResult<Self> {
        let coordinator = Coordinator::new(Arc::new(ScopeLanes::new()), RetryPolicies::default());
        Self::with_coordinator(config, coordinator)
    }

    /// Provider on a caller-built coordinator.
    pub fn with_coordinator(config: ProviderConfig, coordinator: Coordinator) -> ApiResult<Self> {
        let http = HttpClient::from_config(&config)?;
        let api = ApiClient::new(http);

        let systems = Arc::new(PermissionSystemClient::new(api.clone()));
        let roles = Arc::new(RoleClient::new(api.clone()));
        let accounts = Arc::new(ServiceAccountClient::new(api.clone()));
        let tokens = Arc::new(TokenClient::new(api.clone()));
        let policies = Arc::new(PolicyClient::new(api));

        info!(host = %config.host, api_version = %config.api_version, "provider configured");

        Ok(Self {
            permission_systems: PermissionSystemOrchestrator::new(systems, coordinator.clone()),
            roles: RoleOrchestrator::new(roles.clone(), policies.clone(), coordinator.clone()),
            service_accounts: ServiceAccountOrchestrator::new(
                accounts.clone(),
                tokens.clone(),
                coordinator.clone(),
            ),
            tokens: TokenOrchestrator::new(tokens, accounts.clone(), coordinator.clone()),
            policies: PolicyOrchestrator::new(policies, accounts, roles, coordinator.clone()),
            coordinator,
            config,
        })
    }

    /// Configuration the provider was built from.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Coordinator shared by the orchestrators.
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }
}

#[cfg(test)]
mod tests {
    use permsys_domain::ApiErrorKind;

    use super::*;

    #[test]
    fn invalid_config_is_fatal() {
        let err = Provider::isolated(ProviderConfig::new("https://api.example.com", ""))
            .err()
            .expect("missing token must be rejected");
        assert_eq!(err.kind(), ApiErrorKind::Fatal);
        assert!(err.message().contains("token"));
    }

    #[test]
    fn shares_the_global_lane_registry() {
        let config = ProviderConfig::new("https://api.example.com", "t");
        let a = Provider::new(config.clone()).unwrap();
        let b = Provider::new(config).unwrap();
        assert!(Arc::ptr_eq(a.coordinator().lanes(), b.coordinator().lanes()));

        let isolated = Provider::isolated(ProviderConfig::new("https://api.example.com", "t")).unwrap();
        assert!(!Arc::ptr_eq(a.coordinator().lanes(), isolated.coordinator().lanes()));
    }
}

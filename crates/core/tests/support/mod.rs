//! Shared test helpers for `permsys-core` integration tests.
//!
//! [`FakeControlPlane`] is an in-memory stand-in for the remote API that
//! honours the port contracts (etags, `If-Match`, 404 on delete) and can
//! script failures, hide fresh entities from reads, and record every call.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use permsys_common::testing::ConcurrencyProbe;
use permsys_common::ScopeLanes;
use permsys_core::ports::{PermissionSystemApi, PolicyApi, RoleApi, ServiceAccountApi, TokenApi};
use permsys_core::{
    Coordinator, PolicyOrchestrator, RetryPolicies, RoleOrchestrator, ServiceAccountOrchestrator,
    TokenOrchestrator,
};
use permsys_domain::{
    ApiError, ApiResult, ETag, Entity, EntityBundle, PermissionSystem, Policy, Role, ScopeId,
    ServiceAccount, Token,
};

type Key = (String, String);

#[derive(Default)]
struct Store {
    next_id: u64,
    next_etag: u64,
    systems: HashMap<String, PermissionSystem>,
    roles: HashMap<Key, Role>,
    accounts: HashMap<Key, ServiceAccount>,
    tokens: HashMap<Key, Token>,
    policies: HashMap<Key, Policy>,
    /// Remaining reads for which a fresh id still answers 404
    hidden: HashMap<String, u32>,
    /// Scripted failures keyed by operation name
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    calls: Vec<String>,
}

impl Store {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn etag(&mut self) -> ETag {
        self.next_etag += 1;
        ETag::new(format!("W/\"{}\"", self.next_etag))
    }

    fn scripted(&mut self, op: &'static str) -> ApiResult<()> {
        match self.failures.get_mut(op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn visible(&mut self, id: &str) -> bool {
        match self.hidden.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                false
            }
            _ => true,
        }
    }
}

/// In-memory control plane implementing every port.
#[derive(Clone)]
pub struct FakeControlPlane {
    store: Arc<Mutex<Store>>,
    /// Time each mutation spends "on the wire"
    latency: Duration,
    /// Mutations in flight per scope
    mutations: Arc<Mutex<HashMap<String, ConcurrencyProbe>>>,
    /// Reads a freshly created entity stays invisible for
    visibility_lag: Arc<Mutex<u32>>,
}

impl Default for FakeControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            latency: Duration::from_millis(10),
            mutations: Arc::new(Mutex::new(HashMap::new())),
            visibility_lag: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_scope(self, scope: &str) -> Self {
        let mut system = PermissionSystem::default();
        system.meta.id = scope.to_string();
        system.meta.name = scope.to_string();
        system.meta.etag = ETag::new("ps-etag");
        self.store.lock().systems.insert(scope.to_string(), system);
        self
    }

    /// Queue `err` as the next result of `op` (e.g. `"update_service_account"`).
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.store.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Fresh entities answer 404 to their first `reads` GETs.
    pub fn set_visibility_lag(&self, reads: u32) {
        *self.visibility_lag.lock() = reads;
    }

    pub fn calls(&self) -> Vec<String> {
        self.store.lock().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.store.lock().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Peak number of concurrent mutations seen in `scope`.
    pub fn peak_mutations(&self, scope: &str) -> usize {
        self.mutations.lock().get(scope).map_or(0, ConcurrencyProbe::max_observed)
    }

    /// Simulate a write from another process: bump the etag.
    pub fn touch_service_account(&self, scope: &str, id: &str) {
        let mut store = self.store.lock();
        let etag = store.etag();
        if let Some(account) = store.accounts.get_mut(&(scope.to_string(), id.to_string())) {
            account.meta.etag = etag;
        }
    }

    pub fn insert_policy(&self, policy: Policy) {
        let key = (policy.meta.scope_id.to_string(), policy.meta.id.clone());
        self.store.lock().policies.insert(key, policy);
    }

    pub fn contains_token(&self, scope: &str, id: &str) -> bool {
        self.store.lock().tokens.contains_key(&(scope.to_string(), id.to_string()))
    }

    fn log(&self, call: String) {
        self.store.lock().calls.push(call);
    }

    async fn on_wire(&self, scope: &ScopeId) {
        let probe = self.mutations.lock().entry(scope.to_string()).or_default().clone();
        let _inside = probe.enter();
        tokio::time::sleep(self.latency).await;
    }

    fn stamp_new<E: Entity>(&self, entity: &mut E, prefix: &str) -> ETag {
        let lag = *self.visibility_lag.lock();
        let mut store = self.store.lock();
        let id = store.id(prefix);
        let etag = store.etag();
        if lag > 0 {
            store.hidden.insert(id.clone(), lag);
        }
        let meta = entity.meta_mut();
        meta.id = id;
        meta.created_at = Some(Utc::now());
        meta.creator = Some("tester".into());
        meta.updated_at = meta.created_at;
        meta.updater = meta.creator.clone();
        meta.etag = etag.clone();
        etag
    }

    fn get_from<E: Entity>(
        &self,
        op: &'static str,
        map: impl FnOnce(&Store) -> Option<E>,
        id: &str,
    ) -> ApiResult<EntityBundle<E>> {
        let mut store = self.store.lock();
        store.calls.push(format!("{op} {id}"));
        store.scripted(op)?;
        if !store.visible(id) {
            return Err(ApiError::NotFound(format!("{} {id} not found", E::KIND)));
        }
        match map(&store) {
            Some(entity) => {
                let etag = entity.etag().clone();
                Ok(EntityBundle::new(entity, etag))
            }
            None => Err(ApiError::NotFound(format!("{} {id} not found", E::KIND))),
        }
    }
}

fn key(scope: &ScopeId, id: &str) -> Key {
    (scope.to_string(), id.to_string())
}

#[async_trait]
impl PermissionSystemApi for FakeControlPlane {
    async fn list_permission_systems(&self) -> ApiResult<Vec<PermissionSystem>> {
        self.log("list_permission_systems".into());
        Ok(self.store.lock().systems.values().cloned().collect())
    }

    async fn get_permission_system(
        &self,
        scope: &ScopeId,
    ) -> ApiResult<EntityBundle<PermissionSystem>> {
        let wanted = scope.to_string();
        self.get_from("get_permission_system", |s| s.systems.get(&wanted).cloned(), scope.as_str())
    }
}

#[async_trait]
impl RoleApi for FakeControlPlane {
    async fn list_roles(&self, scope: &ScopeId) -> ApiResult<Vec<Role>> {
        self.log(format!("list_roles {scope}"));
        let store = self.store.lock();
        Ok(store.roles.values().filter(|r| r.scope() == scope).cloned().collect())
    }

    async fn get_role(&self, scope: &ScopeId, id: &str) -> ApiResult<EntityBundle<Role>> {
        let k = key(scope, id);
        self.get_from("get_role", |s| s.roles.get(&k).cloned(), id)
    }

    async fn create_role(&self, role: &Role) -> ApiResult<EntityBundle<Role>> {
        self.log(format!("create_role {}", role.meta.name));
        self.on_wire(role.scope()).await;
        self.store.lock().scripted("create_role")?;
        let mut created = role.clone();
        let etag = self.stamp_new(&mut created, "role");
        self.store.lock().roles.insert(key(role.scope(), created.id()), created.clone());
        Ok(EntityBundle::new(created, etag))
    }

    async fn update_role(&self, role: &Role, etag: &ETag) -> ApiResult<EntityBundle<Role>> {
        self.log(format!("update_role {}", role.id()));
        Err(ApiError::Fatal(format!("role {} cannot be updated in place ({etag})", role.id())))
    }

    async fn delete_role(&self, scope: &ScopeId, id: &str) -> ApiResult<()> {
        self.log(format!("delete_role {id}"));
        self.on_wire(scope).await;
        let mut store = self.store.lock();
        store.scripted("delete_role")?;
        store
            .roles
            .remove(&key(scope, id))
            .map(drop)
            .ok_or_else(|| ApiError::NotFound(format!("role {id} not found")))
    }
}

#[async_trait]
impl ServiceAccountApi for FakeControlPlane {
    async fn list_service_accounts(&self, scope: &ScopeId) -> ApiResult<Vec<ServiceAccount>> {
        self.log(format!("list_service_accounts {scope}"));
        let store = self.store.lock();
        Ok(store.accounts.values().filter(|a| a.scope() == scope).cloned().collect())
    }

    async fn get_service_account(
        &self,
        scope: &ScopeId,
        id: &str,
    ) -> ApiResult<EntityBundle<ServiceAccount>> {
        let k = key(scope, id);
        self.get_from("get_service_account", |s| s.accounts.get(&k).cloned(), id)
    }

    async fn create_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ApiResult<EntityBundle<ServiceAccount>> {
        self.log(format!("create_service_account {}", account.meta.name));
        self.on_wire(account.scope()).await;
        self.store.lock().scripted("create_service_account")?;
        let mut created = account.clone();
        let etag = self.stamp_new(&mut created, "sa");
        self.store.lock().accounts.insert(key(account.scope(), created.id()), created.clone());
        Ok(EntityBundle::new(created, etag))
    }

    async fn update_service_account(
        &self,
        account: &ServiceAccount,
        etag: &ETag,
    ) -> ApiResult<EntityBundle<ServiceAccount>> {
        self.log(format!("update_service_account {} if-match {etag}", account.id()));
        self.on_wire(account.scope()).await;
        let mut store = self.store.lock();
        store.scripted("update_service_account")?;
        let k = key(account.scope(), account.id());
        let current = store
            .accounts
            .get(&k)
            .map(|a| a.meta.etag.clone())
            .ok_or_else(|| ApiError::NotFound(format!("service account {} not found", account.id())))?;
        let if_match = if etag.is_empty() { current.clone() } else { etag.clone() };
        if if_match != current {
            return Err(ApiError::PreconditionFailed(format!(
                "etag {if_match} does not match {current}"
            )));
        }
        let new_etag = store.etag();
        let mut updated = account.clone();
        updated.meta.etag = new_etag.clone();
        updated.meta.updated_at = Some(Utc::now());
        updated.meta.updater = Some("tester".into());
        store.accounts.insert(k, updated.clone());
        Ok(EntityBundle::new(updated, new_etag))
    }

    async fn delete_service_account(&self, scope: &ScopeId, id: &str) -> ApiResult<()> {
        self.log(format!("delete_service_account {id}"));
        self.on_wire(scope).await;
        let mut store = self.store.lock();
        store.scripted("delete_service_account")?;
        store
            .accounts
            .remove(&key(scope, id))
            .map(drop)
            .ok_or_else(|| ApiError::NotFound(format!("service account {id} not found")))
    }
}

#[async_trait]
impl TokenApi for FakeControlPlane {
    async fn list_tokens(&self, scope: &ScopeId, service_account_id: &str) -> ApiResult<Vec<Token>> {
        self.log(format!("list_tokens {service_account_id}"));
        let store = self.store.lock();
        Ok(store
            .tokens
            .values()
            .filter(|t| t.scope() == scope && t.service_account_id == service_account_id)
            .map(|t| Token { secret: None, ..t.clone() })
            .collect())
    }

    async fn get_token(
        &self,
        scope: &ScopeId,
        _service_account_id: &str,
        id: &str,
    ) -> ApiResult<EntityBundle<Token>> {
        let k = key(scope, id);
        self.get_from("get_token", |s| s.tokens.get(&k).map(|t| Token { secret: None, ..t.clone() }), id)
    }

    async fn create_token(&self, token: &Token) -> ApiResult<EntityBundle<Token>> {
        self.log(format!("create_token {}", token.meta.name));
        self.on_wire(token.scope()).await;
        self.store.lock().scripted("create_token")?;
        let mut created = token.clone();
        let etag = self.stamp_new(&mut created, "tok");
        created.hash = Some(format!("sha256:{}", created.id()));
        created.secret = Some(format!("secret-{}", created.id()));
        self.store.lock().tokens.insert(key(token.scope(), created.id()), created.clone());
        Ok(EntityBundle::new(created, etag))
    }

    async fn update_token(&self, token: &Token, etag: &ETag) -> ApiResult<EntityBundle<Token>> {
        self.log(format!("update_token {} if-match {etag}", token.id()));
        self.on_wire(token.scope()).await;
        let mut store = self.store.lock();
        store.scripted("update_token")?;
        let k = key(token.scope(), token.id());
        let stored = store
            .tokens
            .get(&k)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("token {} not found", token.id())))?;
        if !etag.is_empty() && *etag != stored.meta.etag {
            return Err(ApiError::PreconditionFailed("stale token etag".into()));
        }
        let new_etag = store.etag();
        let mut updated = stored;
        updated.meta.name = token.meta.name.clone();
        updated.meta.description = token.meta.description.clone();
        updated.meta.etag = new_etag.clone();
        store.tokens.insert(k, updated.clone());
        Ok(EntityBundle::new(Token { secret: None, ..updated }, new_etag))
    }

    async fn delete_token(
        &self,
        scope: &ScopeId,
        _service_account_id: &str,
        id: &str,
    ) -> ApiResult<()> {
        self.log(format!("delete_token {id}"));
        self.on_wire(scope).await;
        let mut store = self.store.lock();
        store.scripted("delete_token")?;
        store
            .tokens
            .remove(&key(scope, id))
            .map(drop)
            .ok_or_else(|| ApiError::NotFound(format!("token {id} not found")))
    }
}

#[async_trait]
impl PolicyApi for FakeControlPlane {
    async fn list_policies(&self, scope: &ScopeId) -> ApiResult<Vec<Policy>> {
        self.log(format!("list_policies {scope}"));
        let store = self.store.lock();
        Ok(store.policies.values().filter(|p| p.scope() == scope).cloned().collect())
    }

    async fn get_policy(&self, scope: &ScopeId, id: &str) -> ApiResult<EntityBundle<Policy>> {
        let k = key(scope, id);
        self.get_from("get_policy", |s| s.policies.get(&k).cloned(), id)
    }

    async fn create_policy(&self, policy: &Policy) -> ApiResult<EntityBundle<Policy>> {
        self.log(format!("create_policy {}", policy.meta.name));
        self.on_wire(policy.scope()).await;
        self.store.lock().scripted("create_policy")?;
        let mut created = policy.clone();
        let etag = self.stamp_new(&mut created, "pol");
        self.store.lock().policies.insert(key(policy.scope(), created.id()), created.clone());
        Ok(EntityBundle::new(created, etag))
    }

    async fn delete_policy(&self, scope: &ScopeId, id: &str) -> ApiResult<()> {
        self.log(format!("delete_policy {id}"));
        self.on_wire(scope).await;
        let mut store = self.store.lock();
        store.scripted("delete_policy")?;
        store
            .policies
            .remove(&key(scope, id))
            .map(drop)
            .ok_or_else(|| ApiError::NotFound(format!("policy {id} not found")))
    }
}

/// Orchestrators wired to one fake and a private lane registry.
pub struct Harness {
    pub api: FakeControlPlane,
    pub lanes: Arc<ScopeLanes>,
    pub roles: RoleOrchestrator,
    pub accounts: ServiceAccountOrchestrator,
    pub tokens: TokenOrchestrator,
    pub policies: PolicyOrchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_api(FakeControlPlane::new().with_scope("ps-1").with_scope("ps-2"))
    }

    pub fn with_api(api: FakeControlPlane) -> Self {
        let lanes = Arc::new(ScopeLanes::new());
        let coordinator = Coordinator::new(Arc::clone(&lanes), RetryPolicies::default());
        let shared = Arc::new(api.clone());
        Self {
            roles: RoleOrchestrator::new(shared.clone(), shared.clone(), coordinator.clone()),
            accounts: ServiceAccountOrchestrator::new(
                shared.clone(),
                shared.clone(),
                coordinator.clone(),
            ),
            tokens: TokenOrchestrator::new(shared.clone(), shared.clone(), coordinator.clone()),
            policies: PolicyOrchestrator::new(shared.clone(), shared.clone(), shared, coordinator),
            api,
            lanes,
        }
    }
}

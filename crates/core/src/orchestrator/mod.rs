//! Per-entity CRUD orchestration
//!
//! Each orchestrator composes the scope lanes, the retry loops, the
//! existence waiter and an entity port into the contract a plugin host
//! calls in parallel:
//!
//! - **create**: wait for parents, take the scope's create lane, retry the
//!   POST, stamp computed attributes
//! - **read**: GET; absence returns `None` so the host drops the entity
//! - **update**: entity-specific (etag-guarded PUT, destroy-then-create,
//!   or refused)
//! - **delete**: take the scope's delete lane, run the delete loop
//!
//! Terminal failures are returned as [`ApiError`] and also recorded in the
//! caller's [`Diagnostics`].

mod permission_system;
mod policy;
mod role;
mod service_account;
mod token;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use permsys_common::{LaneKind, LanePermit, OperationContext, ScopeLanes};
use permsys_domain::{ApiError, ApiResult, Diagnostics, ETag, Entity, Lifecycle, ScopeId};
pub use permission_system::PermissionSystemOrchestrator;
pub use policy::PolicyOrchestrator;
pub use role::RoleOrchestrator;
pub use service_account::ServiceAccountOrchestrator;
pub use token::TokenOrchestrator;
use tracing::{debug, warn};

use crate::existence::{ExistenceProbe, ExistenceWaiter};
use crate::interrupt::cancelled;
use crate::retry::{DeleteRetry, RetryEngine, RetryPolicies};

/// CRUD entrypoints for one entity type.
#[async_trait]
pub trait ResourceOrchestrator: Send + Sync {
    type Entity: Entity;

    /// Create `planned` and return it stamped with server-computed
    /// attributes.
    async fn create(
        &self,
        ctx: &OperationContext,
        planned: Self::Entity,
        diags: &mut Diagnostics,
    ) -> ApiResult<Self::Entity>;

    /// Refresh `state` from the server; `None` when it no longer exists.
    async fn read(
        &self,
        ctx: &OperationContext,
        state: Self::Entity,
        diags: &mut Diagnostics,
    ) -> ApiResult<Option<Self::Entity>>;

    /// Move from `prior` to `planned`.
    async fn update(
        &self,
        ctx: &OperationContext,
        prior: Self::Entity,
        planned: Self::Entity,
        diags: &mut Diagnostics,
    ) -> ApiResult<Self::Entity>;

    /// Delete `state`. Deleting an absent entity succeeds.
    async fn delete(
        &self,
        ctx: &OperationContext,
        state: &Self::Entity,
        diags: &mut Diagnostics,
    ) -> ApiResult<()>;
}

/// Shared machinery handed to every orchestrator.
#[derive(Clone)]
pub struct Coordinator {
    lanes: Arc<ScopeLanes>,
    creates: RetryEngine,
    engine: RetryEngine,
    deletes: DeleteRetry,
    waiter: ExistenceWaiter,
    confirm_creates: bool,
}

impl Coordinator {
    /// Coordinator on `lanes`, tuned by `policies`.
    pub fn new(lanes: Arc<ScopeLanes>, policies: RetryPolicies) -> Self {
        Self {
            lanes,
            creates: RetryEngine::new(policies.create),
            engine: RetryEngine::new(policies.generic),
            deletes: DeleteRetry::new(policies.delete),
            waiter: ExistenceWaiter::new(policies.existence, policies.consistency),
            confirm_creates: true,
        }
    }

    /// Coordinator on the process-wide lane registry with default tuning.
    pub fn global() -> Self {
        Self::new(ScopeLanes::global(), RetryPolicies::default())
    }

    /// Toggle the post-create read-after-write check.
    pub fn with_create_confirmation(mut self, enabled: bool) -> Self {
        self.confirm_creates = enabled;
        self
    }

    /// Lane registry shared by every orchestrator.
    pub fn lanes(&self) -> &Arc<ScopeLanes> {
        &self.lanes
    }

    pub fn waiter(&self) -> &ExistenceWaiter {
        &self.waiter
    }

    pub(crate) async fn acquire(
        &self,
        kind: LaneKind,
        scope: &ScopeId,
        ctx: &OperationContext,
        operation: &str,
    ) -> ApiResult<LanePermit> {
        self.lanes
            .acquire(kind, scope.as_str(), ctx)
            .await
            .map_err(|reason| cancelled(&format!("{operation} waiting for {kind} lane"), reason))
    }

    /// Run a create under the scope's create lane. Retries re-issue the
    /// same request; there is no etag to refresh. 5xx responses are retried
    /// too.
    pub(crate) async fn create<T, F, Fut>(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        name: &str,
        scope: &ScopeId,
        op: F,
    ) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let permit = self.acquire(LaneKind::Create, scope, ctx, name).await;
        let _permit = record(diags, name, permit)?;
        let (result, retry_diags) =
            self.creates.run(ctx, name, &op, || async { Ok(ETag::empty()) }, |_| op()).await;
        settle(diags, name, result, retry_diags)
    }

    /// Run an etag-guarded update under the scope's create lane.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn update<T, R, RFut, W, WFut>(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        name: &str,
        scope: &ScopeId,
        etag: ETag,
        refresh_etag: R,
        update: W,
    ) -> ApiResult<T>
    where
        R: FnMut() -> RFut,
        RFut: Future<Output = ApiResult<ETag>>,
        W: Fn(ETag) -> WFut,
        WFut: Future<Output = ApiResult<T>>,
    {
        let permit = self.acquire(LaneKind::Create, scope, ctx, name).await;
        let _permit = record(diags, name, permit)?;
        let (result, retry_diags) =
            self.engine.run(ctx, name, || update(etag), refresh_etag, &update).await;
        settle(diags, name, result, retry_diags)
    }

    /// Run a delete under the scope's delete lane.
    pub(crate) async fn delete<F, Fut>(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        name: &str,
        scope: &ScopeId,
        op: F,
    ) -> ApiResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let permit = self.acquire(LaneKind::Delete, scope, ctx, name).await;
        let _permit = record(diags, name, permit)?;
        self.delete_held(ctx, diags, name, op).await
    }

    /// Run the delete loop for a caller that already holds the delete lane.
    pub(crate) async fn delete_held<F, Fut>(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        name: &str,
        op: F,
    ) -> ApiResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let (result, retry_diags) = self.deletes.run(ctx, name, op).await;
        settle(diags, name, result, retry_diags)
    }

    /// Block on a parent's existence before a dependent create.
    pub(crate) async fn wait_for_parents(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        name: &str,
        probes: &[Box<dyn ExistenceProbe>],
    ) -> ApiResult<()> {
        let result = self.waiter.wait_all(ctx, probes).await;
        record(diags, &format!("{name}: waiting for dependencies"), result)
    }

    /// Post-create read-after-write check. Never fails the create.
    pub(crate) async fn confirm_created<F, Fut>(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        target: &str,
        probe: F,
    ) where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<bool>>,
    {
        if !self.confirm_creates {
            return;
        }
        match self.waiter.confirm_visible(ctx, target, probe).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(target, "created entity not yet readable");
                diags.warning(
                    format!("{target} is not readable yet"),
                    "the create succeeded but the read path has not caught up; \
                     the next refresh reconciles it",
                );
            }
            Err(err) => {
                warn!(target, error = %err, "post-create visibility check failed");
                diags.warning(format!("could not confirm {target}"), err.to_string());
            }
        }
    }

    /// Read through the context without lanes or retries. `NotFound` maps
    /// to `None`.
    pub(crate) async fn read<T, Fut>(
        &self,
        ctx: &OperationContext,
        diags: &mut Diagnostics,
        name: &str,
        fut: Fut,
    ) -> ApiResult<Option<T>>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        let result = match ctx.run(fut).await {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(err)) if err.is_not_found() => {
                debug!(operation = name, "entity absent");
                Ok(None)
            }
            Ok(Err(err)) => Err(err),
            Err(reason) => Err(cancelled(name, reason)),
        };
        record(diags, name, result)
    }
}

/// Record a terminal error in `diags` and pass the result through.
pub(crate) fn record<T>(diags: &mut Diagnostics, name: &str, result: ApiResult<T>) -> ApiResult<T> {
    if let Err(err) = &result {
        diags.api_error(format!("{name} failed"), err);
    }
    result
}

/// Merge a retry loop's diagnostics; add an error entry when the loop did
/// not already explain the failure.
fn settle<T>(
    diags: &mut Diagnostics,
    name: &str,
    result: ApiResult<T>,
    retry_diags: Diagnostics,
) -> ApiResult<T> {
    let explained = retry_diags.has_errors();
    diags.append(retry_diags);
    match result {
        Err(err) if !explained => record(diags, name, Err(err)),
        other => other,
    }
}

/// Log a lifecycle transition for one entity.
pub(crate) fn transition(kind: &str, id: &str, from: Lifecycle, to: Lifecycle) {
    debug_assert!(from.can_transition_to(to), "illegal {kind} transition {from} -> {to}");
    debug!(kind, id, from = %from, to = %to, "lifecycle transition");
}

/// Fatal error recorded as a diagnostic.
pub(crate) fn refuse<T>(diags: &mut Diagnostics, summary: &str, message: String) -> ApiResult<T> {
    record(diags, summary, Err(ApiError::Fatal(message)))
}

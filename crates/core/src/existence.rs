//! Existence gates for dependent creates
//!
//! A token cannot be created before its service account is readable, and a
//! policy cannot be created before its principal and every role it names
//! are readable. [`ExistenceWaiter::wait_exists`] polls a probe with
//! exponential backoff until the parent shows up or the caller's deadline
//! expires. Absence (`NotFound`) means "not yet"; any other probe error
//! ends the wait.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use permsys_common::{Backoff, Jitter, OperationContext};
use permsys_domain::{ApiResult, ScopeId};
use tracing::{debug, instrument};

use crate::interrupt::cancelled;
use crate::ports::{PermissionSystemApi, RoleApi, ServiceAccountApi};
use crate::retry::{ConsistencyPoll, PollPolicy};

/// Delay before the second probe
pub const EXISTENCE_BASE_DELAY: Duration = Duration::from_millis(250);

/// Delay cap before jitter
pub const EXISTENCE_MAX_DELAY: Duration = Duration::from_secs(5);

/// Jitter adds up to this share of the current delay
pub const EXISTENCE_JITTER_FACTOR: f64 = 0.5;

/// 250 ms doubling to 5 s, plus up to half the delay.
pub const fn default_backoff() -> Backoff {
    Backoff::new(EXISTENCE_BASE_DELAY)
        .with_max(EXISTENCE_MAX_DELAY)
        .with_jitter(Jitter::Proportional(EXISTENCE_JITTER_FACTOR))
}

/// Something whose remote visibility can be checked.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Human-readable target, e.g. `service account sa-1`.
    fn target(&self) -> String;

    async fn is_visible(&self) -> ApiResult<bool>;
}

/// Permission system (scope) readable via `GET /ps/{scope}`
pub struct PermissionSystemProbe {
    api: Arc<dyn PermissionSystemApi>,
    scope: ScopeId,
}

impl PermissionSystemProbe {
    /// Probe for the permission system `scope` itself.
    pub fn new(api: Arc<dyn PermissionSystemApi>, scope: ScopeId) -> Self {
        Self { api, scope }
    }
}

#[async_trait]
impl ExistenceProbe for PermissionSystemProbe {
    fn target(&self) -> String {
        format!("permission system {}", self.scope)
    }

    async fn is_visible(&self) -> ApiResult<bool> {
        self.api.get_permission_system(&self.scope).await.map(|_| true)
    }
}

/// Service account readable in its scope
pub struct ServiceAccountProbe {
    api: Arc<dyn ServiceAccountApi>,
    scope: ScopeId,
    id: String,
}

impl ServiceAccountProbe {
    pub fn new(api: Arc<dyn ServiceAccountApi>, scope: ScopeId, id: impl Into<String>) -> Self {
        Self { api, scope, id: id.into() }
    }
}

#[async_trait]
impl ExistenceProbe for ServiceAccountProbe {
    fn target(&self) -> String {
        format!("service account {}", self.id)
    }

    async fn is_visible(&self) -> ApiResult<bool> {
        self.api.get_service_account(&self.scope, &self.id).await.map(|_| true)
    }
}

/// Role readable in its scope
pub struct RoleProbe {
    api: Arc<dyn RoleApi>,
    scope: ScopeId,
    id: String,
}

impl RoleProbe {
    pub fn new(api: Arc<dyn RoleApi>, scope: ScopeId, id: impl Into<String>) -> Self {
        Self { api, scope, id: id.into() }
    }
}

#[async_trait]
impl ExistenceProbe for RoleProbe {
    fn target(&self) -> String {
        format!("role {}", self.id)
    }

    async fn is_visible(&self) -> ApiResult<bool> {
        self.api.get_role(&self.scope, &self.id).await.map(|_| true)
    }
}

/// Polls probes until their targets are readable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExistenceWaiter {
    backoff: Backoff,
    consistency: ConsistencyPoll,
}

impl Default for ExistenceWaiter {
    fn default() -> Self {
        Self::new(default_backoff(), PollPolicy::consistency())
    }
}

impl ExistenceWaiter {
    /// Waiter backing off on `backoff` between probes.
    pub fn new(backoff: Backoff, consistency: PollPolicy) -> Self {
        Self { backoff, consistency: ConsistencyPoll::new(consistency) }
    }

    /// Block until `probe` reports visible.
    ///
    /// # Errors
    /// `Cancelled` when the context is cancelled or its deadline passes
    /// first; any non-`NotFound` probe error unchanged.
    #[instrument(level = "debug", skip_all, fields(target = %probe.target()))]
    pub async fn wait_exists(&self, ctx: &OperationContext, probe: &dyn ExistenceProbe) -> ApiResult<()> {
        let mut attempt = 0u32;
        loop {
            let outcome = ctx
                .run(probe.is_visible())
                .await
                .map_err(|reason| cancelled(&format!("waiting for {}", probe.target()), reason))?;

            match outcome {
                Ok(true) => {
                    debug!(polls = attempt + 1, "target visible");
                    return Ok(());
                }
                Ok(false) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }

            let delay = self.backoff.delay(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "target not visible yet");
            ctx.sleep(delay)
                .await
                .map_err(|reason| cancelled(&format!("waiting for {}", probe.target()), reason))?;
            attempt += 1;
        }
    }

    /// Wait for every probe concurrently; the first failure wins.
    pub async fn wait_all(
        &self,
        ctx: &OperationContext,
        probes: &[Box<dyn ExistenceProbe>],
    ) -> ApiResult<()> {
        try_join_all(probes.iter().map(|probe| self.wait_exists(ctx, probe.as_ref()))).await?;
        Ok(())
    }

    /// Short read-after-write check. `Ok(false)` when the target did not
    /// become readable within the consistency poll budget.
    pub async fn confirm_visible<F, Fut>(
        &self,
        ctx: &OperationContext,
        target: &str,
        probe: F,
    ) -> ApiResult<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<bool>>,
    {
        self.consistency.poll(ctx, &format!("confirm {target}"), probe).await
    }
}

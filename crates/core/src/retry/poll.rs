//! Short-delay consistency polling
//!
//! Used right after a write to check that the read path has caught up.
//! Sub-second first delays and a small probe budget keep it cheap; it
//! reports "not yet visible" instead of failing when the budget runs out.

use std::future::Future;

use permsys_common::OperationContext;
use permsys_domain::ApiResult;
use tracing::{debug, instrument};

use super::policy::PollPolicy;
use crate::interrupt::cancelled;

/// Short read-after-write poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyPoll {
    policy: PollPolicy,
}

impl Default for ConsistencyPoll {
    fn default() -> Self {
        Self::new(PollPolicy::consistency())
    }
}

impl ConsistencyPoll {
    pub const fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// Same schedule with a caller-chosen probe budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy = self.policy.with_max_attempts(max_attempts);
        self
    }

    /// Tuning in use.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Probe until it reports visible or the budget is spent.
    ///
    /// `NotFound` from the probe counts as "not yet". Returns `Ok(false)`
    /// when every probe came back negative.
    #[instrument(level = "debug", skip_all, fields(operation = name))]
    pub async fn poll<F, Fut>(&self, ctx: &OperationContext, name: &str, mut probe: F) -> ApiResult<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<bool>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.policy.backoff.delay(attempt - 1);
                ctx.sleep(delay).await.map_err(|reason| cancelled(name, reason))?;
            }

            match ctx.run(probe()).await.map_err(|reason| cancelled(name, reason))? {
                Ok(true) => {
                    debug!(attempt, "visible");
                    return Ok(true);
                }
                Ok(false) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        debug!(attempts, "not visible within poll budget");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use permsys_domain::{ApiError, ApiErrorKind};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn becomes_visible_on_third_probe() {
        let calls = AtomicU32::new(0);
        let visible = ConsistencyPoll::default()
            .poll(&OperationContext::new(), "confirm role", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ApiError::NotFound("not yet".into()))
                } else {
                    Ok(true)
                }
            })
            .await
            .unwrap();
        assert!(visible);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_is_overridable() {
        let calls = AtomicU32::new(0);
        let visible = ConsistencyPoll::default()
            .with_max_attempts(5)
            .poll(&OperationContext::new(), "confirm role", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            })
            .await
            .unwrap();
        assert!(!visible);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_bubble() {
        let err = ConsistencyPoll::default()
            .poll(&OperationContext::new(), "confirm role", || async {
                Err(ApiError::Fatal("forbidden".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Fatal);
    }
}

//! Delete retry loop
//!
//! Deletes tolerate more than updates do: `Conflict`, `Throttled` and
//! `Transient` are all retried, `NotFound` at any attempt counts as success,
//! and the loop never sleeps past the caller's deadline.

use std::future::Future;

use permsys_common::OperationContext;
use permsys_domain::{ApiResult, Diagnostics};
use tracing::{debug, info, instrument, warn};

use super::engine::RetryOutcome;
use super::policy::RetryPolicy;
use crate::interrupt::cancelled;

/// Delete-specific retry loop; see [`RetryPolicy::delete`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteRetry {
    policy: RetryPolicy,
}

impl Default for DeleteRetry {
    fn default() -> Self {
        Self::new(RetryPolicy::delete())
    }
}

impl DeleteRetry {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Tuning in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `delete` until it succeeds, the target is gone, or the error is
    /// terminal.
    #[instrument(level = "debug", skip_all, fields(operation = name))]
    pub async fn run<F, Fut>(
        &self,
        ctx: &OperationContext,
        name: &str,
        mut delete: F,
    ) -> RetryOutcome<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let mut diags = Diagnostics::new();
        let mut retries = 0u32;

        loop {
            let err = match ctx.run(delete()).await {
                Ok(Ok(())) => {
                    if retries > 0 {
                        info!(retries, "delete succeeded after retries");
                        diags.info(
                            format!("{name} succeeded after {retries} retries"),
                            "transient failures were absorbed automatically",
                        );
                    }
                    return (Ok(()), diags);
                }
                Ok(Err(err)) if err.is_not_found() => {
                    debug!("target already absent");
                    return (Ok(()), diags);
                }
                Ok(Err(err)) => err,
                Err(reason) => return (Err(cancelled(name, reason)), diags),
            };

            if !err.is_retryable_on_delete() {
                return (Err(err), diags);
            }

            if retries >= self.policy.max_retries {
                warn!(error = %err, max_retries = self.policy.max_retries, "delete retries exhausted");
                diags.error(
                    format!("{name} failed after {} retries", self.policy.max_retries),
                    format!("{err}. {}", err.kind().recovery_hint()),
                );
                return (Err(err), diags);
            }

            let delay = self.policy.backoff.delay(retries);
            if ctx.would_exceed_deadline(delay) {
                warn!(error = %err, delay_ms = delay.as_millis() as u64, "next delete retry would pass the deadline");
                diags.error(
                    format!("{name} gave up before its deadline"),
                    format!("{err}. {}", err.kind().recovery_hint()),
                );
                return (Err(err), diags);
            }

            debug!(error = %err, retry = retries + 1, delay_ms = delay.as_millis() as u64, "retrying delete");
            diags.info(format!("retrying {name}"), format!("attempt {}: {err}", retries + 1));

            if let Err(reason) = ctx.sleep(delay).await {
                return (Err(cancelled(name, reason)), diags);
            }
            retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use permsys_domain::{ApiError, ApiErrorKind};
    use tokio::time::Instant;

    use super::*;

    fn scripted(
        script: Vec<ApiResult<()>>,
    ) -> (impl FnMut() -> std::future::Ready<ApiResult<()>>, std::sync::Arc<AtomicU32>) {
        let calls = std::sync::Arc::new(AtomicU32::new(0));
        let counter = std::sync::Arc::clone(&calls);
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
            std::future::ready(script.get(n).cloned().unwrap_or(Ok(())))
        };
        (op, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_success() {
        let (op, calls) = scripted(vec![Err(ApiError::NotFound("gone".into()))]);
        let (result, diags) = DeleteRetry::default().run(&OperationContext::new(), "delete role", op).await;
        assert!(result.is_ok());
        assert!(diags.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_server_errors_then_absorbs_not_found() {
        let (op, calls) = scripted(vec![
            Err(ApiError::Transient("503".into())),
            Err(ApiError::Throttled("429".into())),
            Err(ApiError::Conflict("busy".into())),
            Err(ApiError::NotFound("gone".into())),
        ]);
        let (result, _) = DeleteRetry::default().run(&OperationContext::new(), "delete token", op).await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn precondition_failure_is_terminal_for_delete() {
        let (op, calls) = scripted(vec![Err(ApiError::PreconditionFailed("stale".into()))]);
        let (result, _) = DeleteRetry::default().run(&OperationContext::new(), "delete role", op).await;
        assert_eq!(result.unwrap_err().kind(), ApiErrorKind::PreconditionFailed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget() {
        let policy = RetryPolicy::delete().with_max_retries(2);
        let (op, calls) = scripted(vec![Err(ApiError::Transient("500".into())); 10]);
        let (result, diags) = DeleteRetry::new(policy).run(&OperationContext::new(), "delete role", op).await;
        assert_eq!(result.unwrap_err().kind(), ApiErrorKind::Transient);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(diags.has_errors());
    }

    #[tokio::test(start_paused = true)]
    async fn refuses_to_sleep_past_deadline() {
        let ctx = OperationContext::new().with_timeout(Duration::from_millis(300));
        let (op, calls) = scripted(vec![Err(ApiError::Transient("500".into())); 10]);
        let started = Instant::now();

        let (result, diags) = DeleteRetry::default().run(&ctx, "delete role", op).await;

        // first backoff is at least 400 ms, past the 300 ms deadline
        assert_eq!(result.unwrap_err().kind(), ApiErrorKind::Transient);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(diags.iter().any(|d| d.summary.contains("deadline")));
    }
}

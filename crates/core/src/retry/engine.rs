//! Generic optimistic-concurrency retry loop
//!
//! Absorbs `Conflict`, `PreconditionFailed` and `Throttled`, plus
//! `Transient` when the policy asks for it (creates). Before every
//! retry the loop sleeps (racing the caller's context), asks for a fresh
//! etag, and re-issues the operation with it.

use std::future::Future;

use permsys_common::OperationContext;
use permsys_domain::{ApiError, ApiResult, Diagnostics, ETag};
use tracing::{debug, info, instrument, warn};

use super::policy::RetryPolicy;
use crate::interrupt::cancelled;

/// Result of a retry loop plus the diagnostics it produced
pub type RetryOutcome<T> = (ApiResult<T>, Diagnostics);

/// Backoff loop that refreshes the etag before each retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryEngine {
    policy: RetryPolicy,
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::new(RetryPolicy::generic())
    }
}

impl RetryEngine {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Tuning in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `first_attempt`, then on retryable failures sleep, call
    /// `refresh_etag`, and call `retry_with_etag` with the fresh tag.
    ///
    /// A refresh failure ends the loop with the refresh error. Cancellation
    /// or deadline expiry ends it with `Cancelled`, without further
    /// attempts. Every attempt is raced against `ctx`.
    #[instrument(level = "debug", skip_all, fields(operation = name))]
    pub async fn run<T, F, FFut, R, RFut, W, WFut>(
        &self,
        ctx: &OperationContext,
        name: &str,
        first_attempt: F,
        mut refresh_etag: R,
        mut retry_with_etag: W,
    ) -> RetryOutcome<T>
    where
        F: FnOnce() -> FFut,
        FFut: Future<Output = ApiResult<T>>,
        R: FnMut() -> RFut,
        RFut: Future<Output = ApiResult<ETag>>,
        W: FnMut(ETag) -> WFut,
        WFut: Future<Output = ApiResult<T>>,
    {
        let mut diags = Diagnostics::new();
        let mut retries = 0u32;
        let mut result = attempt(ctx, name, first_attempt()).await;

        loop {
            let err = match result {
                Ok(value) => {
                    if retries > 0 {
                        info!(retries, "operation succeeded after retries");
                        diags.info(
                            format!("{name} succeeded after {retries} retries"),
                            "transient conflicts were absorbed automatically",
                        );
                    }
                    return (Ok(value), diags);
                }
                Err(err) => err,
            };

            if !self.policy.retries(&err) {
                return (Err(err), diags);
            }

            if retries >= self.policy.max_retries {
                warn!(error = %err, max_retries = self.policy.max_retries, "retries exhausted");
                diags.error(
                    format!("{name} failed after {} retries", self.policy.max_retries),
                    format!("{err}. {}", err.kind().recovery_hint()),
                );
                return (Err(err), diags);
            }

            let delay = self.policy.backoff.delay(retries);
            debug!(error = %err, retry = retries + 1, delay_ms = delay.as_millis() as u64, "retrying operation");
            diags.info(format!("retrying {name}"), retry_detail(&err, retries + 1));

            if let Err(reason) = ctx.sleep(delay).await {
                return (Err(cancelled(name, reason)), diags);
            }
            retries += 1;

            let etag = match attempt(ctx, name, refresh_etag()).await {
                Ok(etag) => etag,
                Err(refresh_err) => {
                    debug!(error = %refresh_err, "etag refresh failed, abandoning retry");
                    return (Err(refresh_err), diags);
                }
            };

            result = attempt(ctx, name, retry_with_etag(etag)).await;
        }
    }
}

async fn attempt<T>(
    ctx: &OperationContext,
    name: &str,
    fut: impl Future<Output = ApiResult<T>>,
) -> ApiResult<T> {
    match ctx.run(fut).await {
        Ok(result) => result,
        Err(reason) => Err(cancelled(name, reason)),
    }
}

fn retry_detail(err: &ApiError, retry: u32) -> String {
    if is_scope_churn(err) {
        format!(
            "attempt {retry}: the permission system configuration changed concurrently; \
             retrying automatically ({})",
            err.message()
        )
    } else {
        format!("attempt {retry}: {err}")
    }
}

/// The remote rejects overlapping mutations in one scope with a synthetic
/// 409 mentioning a restricted configuration change.
pub(crate) fn is_scope_churn(err: &ApiError) -> bool {
    if !matches!(err, ApiError::Conflict(_)) {
        return false;
    }
    let message = err.message().to_ascii_lowercase();
    message.contains("restricted") && message.contains("configuration") && message.contains("changed")
}

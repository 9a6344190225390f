//! Tuning for the three retry loops

use std::time::Duration;

use permsys_common::{Backoff, Jitter};
use permsys_domain::{ApiError, ApiErrorKind};

use super::constants::*;

/// Retry budget plus delay schedule for one loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay schedule between attempts
    pub backoff: Backoff,
    /// Also retry `Transient` (5xx, transport) failures
    pub retry_transient: bool,
}

impl RetryPolicy {
    /// Policy retrying only 409/412/429.
    pub const fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self { max_retries, backoff, retry_transient: false }
    }

    /// 409/412/429 loop: 200 ms doubling to 5 s, plus up to 500 ms.
    pub const fn generic() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Backoff::new(DEFAULT_BASE_DELAY)
                .with_max(DEFAULT_MAX_DELAY)
                .with_jitter(Jitter::Additive(DEFAULT_JITTER_BOUND)),
        )
    }

    /// Create loop: the generic schedule, also absorbing 5xx and transport
    /// failures.
    pub const fn create() -> Self {
        Self::generic().with_transient_retries(true)
    }

    /// Delete loop: 500 ms doubling to 5 s, ±20%.
    pub const fn delete() -> Self {
        Self::new(
            DELETE_MAX_RETRIES,
            Backoff::new(DELETE_BASE_DELAY)
                .with_max(DELETE_MAX_DELAY)
                .with_jitter(Jitter::Symmetric(DELETE_JITTER_FACTOR)),
        )
    }

    /// Same budget with every delay at zero.
    pub const fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Backoff::new(Duration::ZERO))
    }

    /// Override the retry budget.
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Toggle retries on `Transient` failures.
    pub const fn with_transient_retries(mut self, enabled: bool) -> Self {
        self.retry_transient = enabled;
        self
    }

    /// Whether `err` earns another attempt under this policy.
    pub fn retries(&self, err: &ApiError) -> bool {
        err.is_retryable() || (self.retry_transient && err.kind() == ApiErrorKind::Transient)
    }
}

/// Short-delay read-after-write polling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Probes per call, including the first
    pub max_attempts: u32,
    /// Delay schedule between probes
    pub backoff: Backoff,
}

impl PollPolicy {
    /// 100 ms growing by 1.5, plus up to half the delay, three probes.
    pub const fn consistency() -> Self {
        Self {
            max_attempts: CONSISTENCY_MAX_ATTEMPTS,
            backoff: Backoff::new(CONSISTENCY_BASE_DELAY)
                .with_factor(CONSISTENCY_GROWTH)
                .with_jitter(Jitter::Proportional(CONSISTENCY_JITTER_FACTOR)),
        }
    }

    /// Same schedule with `max_attempts` probes.
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Every loop's tuning in one place, handed to the orchestrators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicies {
    /// Etag-guarded updates
    pub generic: RetryPolicy,
    /// Creates; no etag, 5xx retried
    pub create: RetryPolicy,
    /// Deletes; the retried kinds are fixed by the delete loop
    pub delete: RetryPolicy,
    /// Post-create read-after-write check
    pub consistency: PollPolicy,
    /// Existence waiter schedule; it polls until the deadline
    pub existence: Backoff,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            generic: RetryPolicy::generic(),
            create: RetryPolicy::create(),
            delete: RetryPolicy::delete(),
            consistency: PollPolicy::consistency(),
            existence: crate::existence::default_backoff(),
        }
    }
}

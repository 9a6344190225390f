//! Cancellation and deadline propagation
//!
//! The host hands every entrypoint an implicit deadline and a cancellation
//! signal. [`OperationContext`] carries both and offers the two primitives
//! the rest of the workspace suspends through: [`OperationContext::run`]
//! (race a future) and [`OperationContext::sleep`] (race a timer).

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a suspended operation stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Context with a fresh token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context bound to the host's cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self { cancel: token, deadline: None }
    }

    /// Stop waiting at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    /// Context whose token is cancelled with this one but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self { cancel: self.cancel.child_token(), deadline: self.deadline }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token for `select!` against other futures.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Whether sleeping for `delay` would run past the deadline.
    pub fn would_exceed_deadline(&self, delay: Duration) -> bool {
        self.deadline.is_some_and(|d| Instant::now() + delay > d)
    }

    /// Fail fast if already cancelled or past the deadline.
    ///
    /// # Errors
    /// Returns the reason the context is no longer live.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Interrupted::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the token is cancelled, or the
    /// deadline passes. Cancellation wins ties. The future is dropped when
    /// interrupted.
    ///
    /// # Errors
    /// Returns [`Interrupted`] when the future did not complete.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            () = wait_for_deadline(self.deadline) => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Sleep for `delay` unless interrupted first.
    ///
    /// # Errors
    /// Returns [`Interrupted`] when cancellation or the deadline fires before
    /// the timer.
    pub async fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        self.run(tokio::time::sleep(delay)).await
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

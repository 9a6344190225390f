//! Keyed single-slot lanes
//!
//! A lane is a capacity-1 semaphore keyed by `(kind, key)`. Mutations that
//! must not overlap within one key (creates in one permission system, or
//! deletes in one permission system) hold a [`LanePermit`] for their whole
//! retry loop. Different keys and different kinds never block each other.
//!
//! The gate map is the only process-wide mutable structure. Lookups take a
//! shared lock; first insertion for a key takes the exclusive lock and
//! re-checks before inserting. No lock is held while waiting for a gate.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use super::context::{Interrupted, OperationContext};

/// Slots per gate. Two concurrent mutations in one scope already trip the
/// remote's "restricted configuration changed" conflict.
const LANE_CAPACITY: usize = 1;

static GLOBAL_LANES: Lazy<Arc<ScopeLanes>> = Lazy::new(|| Arc::new(ScopeLanes::new()));

/// Which lane family a permit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Creates and updates.
    Create,
    /// Deletes, including the delete half of a recreate.
    Delete,
}

impl LaneKind {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for lane monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneMetrics {
    /// Permits handed out
    pub acquisitions: u64,
    /// Acquisitions that had to wait for another holder
    pub contended: u64,
    /// Acquirers that gave up because of cancellation or deadline
    pub interrupted: u64,
    /// Distinct keys with a create gate
    pub create_keys: usize,
    /// Distinct keys with a delete gate
    pub delete_keys: usize,
}

impl LaneMetrics {
    /// Fraction of acquisitions that found the gate busy (0.0 to 1.0)
    pub fn contention_rate(&self) -> f64 {
        if self.acquisitions == 0 {
            return 0.0;
        }
        self.contended as f64 / self.acquisitions as f64
    }
}

/// Two gate maps, one per [`LaneKind`].
#[derive(Default)]
pub struct ScopeLanes {
    create: RwLock<HashMap<String, Arc<Semaphore>>>,
    delete: RwLock<HashMap<String, Arc<Semaphore>>>,
    acquisitions: AtomicU64,
    contended: AtomicU64,
    interrupted: AtomicU64,
}

impl ScopeLanes {
    /// Empty registry; lanes are created on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by every orchestrator.
    pub fn global() -> Arc<ScopeLanes> {
        Arc::clone(&GLOBAL_LANES)
    }

    fn map(&self, kind: LaneKind) -> &RwLock<HashMap<String, Arc<Semaphore>>> {
        match kind {
            LaneKind::Create => &self.create,
            LaneKind::Delete => &self.delete,
        }
    }

    fn gate(&self, kind: LaneKind, key: &str) -> Arc<Semaphore> {
        let map = self.map(kind);
        if let Some(gate) = map.read().get(key) {
            return Arc::clone(gate);
        }

        let mut guard = map.write();
        Arc::clone(
            guard.entry(key.to_string()).or_insert_with(|| Arc::new(Semaphore::new(LANE_CAPACITY))),
        )
    }

    /// Wait for the `(kind, key)` lane.
    ///
    /// A waiter interrupted by `ctx` leaves no reservation behind.
    ///
    /// # Errors
    /// Returns [`Interrupted`] when `ctx` is cancelled or its deadline passes
    /// first.
    #[instrument(level = "debug", skip(self, ctx), fields(lane = %kind))]
    pub async fn acquire(
        &self,
        kind: LaneKind,
        key: &str,
        ctx: &OperationContext,
    ) -> Result<LanePermit, Interrupted> {
        if let Err(reason) = ctx.check() {
            self.interrupted.fetch_add(1, Ordering::Relaxed);
            return Err(reason);
        }

        let gate = self.gate(kind, key);
        let started = Instant::now();

        let permit = match Arc::clone(&gate).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                trace!(key, "lane busy, waiting");
                match ctx.run(gate.acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    // gates are never closed
                    Ok(Err(_closed)) => return Err(Interrupted::Cancelled),
                    Err(reason) => {
                        self.interrupted.fetch_add(1, Ordering::Relaxed);
                        debug!(key, ?reason, "lane acquisition interrupted");
                        return Err(reason);
                    }
                }
            }
            Err(TryAcquireError::Closed) => return Err(Interrupted::Cancelled),
        };

        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        trace!(key, waited_ms = started.elapsed().as_millis() as u64, "lane acquired");
        Ok(LanePermit { _permit: permit, kind, key: key.to_string(), acquired_at: Instant::now() })
    }

    /// Take the lane only if it is free right now.
    pub fn try_acquire(&self, kind: LaneKind, key: &str) -> Option<LanePermit> {
        let permit = self.gate(kind, key).try_acquire_owned().ok()?;
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        Some(LanePermit { _permit: permit, kind, key: key.to_string(), acquired_at: Instant::now() })
    }

    /// Whether someone currently holds the `(kind, key)` lane.
    pub fn is_held(&self, kind: LaneKind, key: &str) -> bool {
        self.map(kind).read().get(key).is_some_and(|gate| gate.available_permits() == 0)
    }

    /// Snapshot of the counters.
    pub fn metrics(&self) -> LaneMetrics {
        LaneMetrics {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
            create_keys: self.create.read().len(),
            delete_keys: self.delete.read().len(),
        }
    }
}

impl fmt::Debug for ScopeLanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeLanes").field("metrics", &self.metrics()).finish()
    }
}

/// Holding a permit owns the lane; dropping it releases the lane on every
/// exit path, unwinding included.
pub struct LanePermit {
    _permit: OwnedSemaphorePermit,
    kind: LaneKind,
    key: String,
    acquired_at: Instant,
}

impl LanePermit {
    /// Which lane this permit holds.
    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    /// Scope the permit was taken for.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for LanePermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanePermit").field("kind", &self.kind).field("key", &self.key).finish()
    }
}

impl Drop for LanePermit {
    fn drop(&mut self) {
        trace!(
            lane = %self.kind,
            key = %self.key,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "lane released"
        );
    }
}

//! Concurrency observation helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProbeState {
    current: AtomicUsize,
    max: AtomicUsize,
    total: AtomicUsize,
}

/// Counts tasks inside a section and remembers the peak.
///
/// Clones share state, so one probe can be handed to many tasks.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    state: Arc<ProbeState>,
}

impl ConcurrencyProbe {
    /// Probe with nothing recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark entry; the returned guard marks exit when dropped.
    pub fn enter(&self) -> ProbeGuard {
        let now = self.state.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max.fetch_max(now, Ordering::SeqCst);
        self.state.total.fetch_add(1, Ordering::SeqCst);
        ProbeGuard { state: Arc::clone(&self.state) }
    }

    /// Tasks inside right now.
    pub fn current(&self) -> usize {
        self.state.current.load(Ordering::SeqCst)
    }

    /// Peak number of tasks inside at once.
    pub fn max_observed(&self) -> usize {
        self.state.max.load(Ordering::SeqCst)
    }

    /// Entries recorded so far.
    pub fn total(&self) -> usize {
        self.state.total.load(Ordering::SeqCst)
    }
}

/// Exit marker returned by [`ConcurrencyProbe::enter`]
#[derive(Debug)]
pub struct ProbeGuard {
    state: Arc<ProbeState>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.state.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_tracks_peak() {
        let probe = ConcurrencyProbe::new();
        let a = probe.enter();
        let b = probe.enter();
        assert_eq!(probe.current(), 2);
        drop(a);
        drop(b);
        let _c = probe.enter();
        assert_eq!(probe.max_observed(), 2);
        assert_eq!(probe.total(), 3);
        assert_eq!(probe.current(), 1);
    }
}

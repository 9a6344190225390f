//! Resilience patterns for serialized, cancellable remote mutations
//!
//! This module provides **generic, reusable** building blocks:
//! - **Operation context**: a cancellation token plus optional deadline that
//!   every suspension point races against
//! - **Backoff**: exponential delay computation with the jitter shapes the
//!   retry loops need
//! - **Lanes**: per-key single-slot gates, one map per lane kind
//!
//! Nothing here knows about HTTP or entity types; the retry engines and the
//! existence waiter in `permsys-core` compose these pieces with the error
//! taxonomy.

pub mod backoff;
pub mod context;
pub mod lanes;

pub use backoff::{Backoff, Jitter};
pub use context::{Interrupted, OperationContext};
pub use lanes::{LaneKind, LaneMetrics, LanePermit, ScopeLanes};

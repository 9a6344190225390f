//! Domain-agnostic building blocks shared across permsys crates.
//!
//! # Modules
//!
//! - [`resilience`]: operation context (cancellation + deadline), backoff
//!   policies with jitter, and keyed single-slot lanes
//! - `testing` (feature `test-utils`): concurrency probes used by the
//!   workspace's test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types
// ------------------------
pub use resilience::{
    Backoff, Interrupted, Jitter, LaneKind, LaneMetrics, LanePermit, OperationContext, ScopeLanes,
};

//! Testing utilities and helpers
//!
//! - **[`concurrency`]**: probes that record how many tasks were inside a
//!   critical section at once
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use permsys_common::testing::ConcurrencyProbe;
//!
//! let probe = ConcurrencyProbe::new();
//! {
//!     let _inside = probe.enter();
//! }
//! assert_eq!(probe.max_observed(), 1);
//! # }
//! ```

pub mod concurrency;

pub use concurrency::{ConcurrencyProbe, ProbeGuard};

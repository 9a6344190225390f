//! Retry loops for remote mutations
//!
//! Three deliberately separate policies:
//! - [`RetryEngine`]: 409/412/429 with an etag refresh before every retry;
//!   the create policy also retries 5xx
//! - [`DeleteRetry`]: 409/429/5xx, `NotFound` is success, deadline-aware
//! - [`ConsistencyPoll`]: short read-after-write polling
//!
//! Their tuning pulls in different directions, so they share only the
//! [`permsys_common::Backoff`] arithmetic.

pub mod constants;
pub mod delete;
pub mod engine;
pub mod policy;
pub mod poll;

pub use delete::DeleteRetry;
pub use engine::{RetryEngine, RetryOutcome};
pub use policy::{PollPolicy, RetryPolicies, RetryPolicy};
pub use poll::ConsistencyPoll;

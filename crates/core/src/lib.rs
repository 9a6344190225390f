//! # permsys Core
//!
//! Concurrency and consistency logic for managing permission-system
//! resources - no HTTP code.
//!
//! This crate contains:
//! - Port interfaces for the remote entity API (traits)
//! - Retry loops: etag-refreshing, delete, and consistency polling
//! - Existence gates for dependent creates
//! - Per-entity orchestrators composing lanes, retries and waits
//!
//! ## Architecture Principles
//! - Only depends on `permsys-common` and `permsys-domain`
//! - No network, storage or host-framework code
//! - All remote access via [`ports`]

pub mod existence;
pub mod interrupt;
pub mod orchestrator;
pub mod plan;
pub mod ports;
pub mod retry;
pub mod validation;

// Re-export specific items to avoid ambiguity
pub use existence::{
    ExistenceProbe, ExistenceWaiter, PermissionSystemProbe, RoleProbe, ServiceAccountProbe,
};
pub use orchestrator::{
    Coordinator, PermissionSystemOrchestrator, PolicyOrchestrator, ResourceOrchestrator,
    RoleOrchestrator, ServiceAccountOrchestrator, TokenOrchestrator,
};
pub use ports::{PermissionSystemApi, PolicyApi, RoleApi, ServiceAccountApi, TokenApi};
pub use retry::{
    ConsistencyPoll, DeleteRetry, PollPolicy, RetryEngine, RetryOutcome, RetryPolicies,
    RetryPolicy,
};
pub use validation::Validate;

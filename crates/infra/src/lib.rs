//! # permsys Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The authenticated HTTP transport (reqwest)
//! - The response classifier and the per-entity API clients
//! - Configuration loading from env and files
//! - The [`Provider`] composition root
//!
//! ## Architecture
//! - Implements traits defined in `permsys-core`
//! - Contains all "impure" code (network I/O, env, filesystem)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod provider;

// Re-export commonly used items
pub use api::{
    ApiClient, PermissionSystemClient, PolicyClient, RoleClient, ServiceAccountClient, TokenClient,
};
pub use errors::InfraError;
pub use http::{HttpClient, RawResponse};
pub use provider::Provider;

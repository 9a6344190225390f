//! # permsys Domain
//!
//! Domain types and models for the permission-system provider core.
//!
//! This crate contains:
//! - Entity types (roles, service accounts, tokens, policies, permission
//!   systems) and the shared entity skeleton
//! - The error taxonomy crossing the core boundary
//! - The diagnostics stream handed back to the plugin host
//! - Provider configuration structures
//!
//! ## Architecture
//! - No dependencies on other permsys crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod errors;
pub mod lifecycle;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use errors::*;
pub use lifecycle::Lifecycle;
pub use types::*;

//! Entity clients for the control-plane API
//!
//! [`ApiClient`] holds the status and etag rules; the per-entity clients
//! map paths and request bodies and implement the `permsys-core` ports.

pub mod client;
pub mod errors;
pub mod paths;
pub mod permission_systems;
pub mod policies;
pub mod roles;
pub mod service_accounts;
pub mod tokens;
pub mod wire;

pub use client::ApiClient;
pub use errors::{classify, extract_message};
pub use permission_systems::PermissionSystemClient;
pub use policies::PolicyClient;
pub use roles::RoleClient;
pub use service_accounts::ServiceAccountClient;
pub use tokens::TokenClient;

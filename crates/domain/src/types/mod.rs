//! Domain types and models
//!
//! Every managed resource shares the [`EntityMeta`] skeleton and lives in
//! exactly one permission system ([`ScopeId`]).

pub mod entity;
pub mod ids;
pub mod permission_system;
pub mod policy;
pub mod role;
pub mod service_account;
pub mod token;

pub use entity::{Entity, EntityBundle, EntityMeta};
pub use ids::{ETag, ScopeId};
pub use permission_system::PermissionSystem;
pub use policy::Policy;
pub use role::Role;
pub use service_account::ServiceAccount;
pub use token::Token;

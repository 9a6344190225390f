//! Domain-level constants
//!
//! Wire defaults shared by the transport and configuration layers.

/// API version sent in `X-API-Version` when the host does not override it.
pub const DEFAULT_API_VERSION: &str = "25r1";

/// Per-attempt HTTP timeout when the host does not override it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Body field carrying the entity version on servers that predate the
/// `ETag` response header.
pub const EMBEDDED_ETAG_FIELD: &str = "configETag";

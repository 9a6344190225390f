//! Error types used throughout the provider core
//!
//! The taxonomy is semantic: callers compare errors by [`ApiErrorKind`], not
//! by message. Every variant carries a human-readable message that is safe to
//! surface in host diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of API errors, used for retry decisions and host hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Target absent (404)
    NotFound,
    /// Concurrent modification or scope churn (409)
    Conflict,
    /// Stale `If-Match` precondition (412)
    PreconditionFailed,
    /// Rate limited (429)
    Throttled,
    /// Server error (5xx) or transport failure
    Transient,
    /// Validation, auth or malformed payload; never retried
    Fatal,
    /// Host cancellation or deadline exceeded
    Cancelled,
}

impl ApiErrorKind {
    /// Short stable label, used in diagnostics and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::PreconditionFailed => "precondition_failed",
            Self::Throttled => "throttled",
            Self::Transient => "transient",
            Self::Fatal => "fatal",
            Self::Cancelled => "cancelled",
        }
    }

    /// Recovery hint shown next to terminal errors.
    pub fn recovery_hint(self) -> &'static str {
        match self {
            Self::NotFound => "the resource no longer exists; it will be removed from state",
            Self::PreconditionFailed => {
                "the resource changed remotely; the next plan retries from refreshed state"
            }
            Self::Conflict => "the permission system configuration is likely changing elsewhere",
            Self::Throttled => "the API is rate limiting requests; consider lowering parallelism",
            Self::Transient => "the API or network failed; retrying the operation may succeed",
            Self::Fatal => "the request was rejected and will not succeed without changes",
            Self::Cancelled => "the operation was cancelled or its deadline expired",
        }
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned from the provider core to the host
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Fatal error: {0}")]
    Fatal(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl ApiError {
    /// Get the category for this error
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::NotFound(_) => ApiErrorKind::NotFound,
            Self::Conflict(_) => ApiErrorKind::Conflict,
            Self::PreconditionFailed(_) => ApiErrorKind::PreconditionFailed,
            Self::Throttled(_) => ApiErrorKind::Throttled,
            Self::Transient(_) => ApiErrorKind::Transient,
            Self::Fatal(_) => ApiErrorKind::Fatal,
            Self::Cancelled(_) => ApiErrorKind::Cancelled,
        }
    }

    /// Build an error of the given category.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ApiErrorKind::NotFound => Self::NotFound(message),
            ApiErrorKind::Conflict => Self::Conflict(message),
            ApiErrorKind::PreconditionFailed => Self::PreconditionFailed(message),
            ApiErrorKind::Throttled => Self::Throttled(message),
            ApiErrorKind::Transient => Self::Transient(message),
            ApiErrorKind::Fatal => Self::Fatal(message),
            ApiErrorKind::Cancelled => Self::Cancelled(message),
        }
    }

    /// The human-readable message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::Conflict(m)
            | Self::PreconditionFailed(m)
            | Self::Throttled(m)
            | Self::Transient(m)
            | Self::Fatal(m)
            | Self::Cancelled(m) => m,
        }
    }

    /// Whether this is a 404.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ApiErrorKind::NotFound
    }

    /// Whether the caller cancelled or ran out of time.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ApiErrorKind::Cancelled
    }

    /// Whether the generic retry engine absorbs this error (409, 412, 429).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ApiErrorKind::Conflict | ApiErrorKind::PreconditionFailed | ApiErrorKind::Throttled
        )
    }

    /// Whether the delete retry loop absorbs this error (409, 429, 5xx).
    pub fn is_retryable_on_delete(&self) -> bool {
        matches!(
            self.kind(),
            ApiErrorKind::Conflict | ApiErrorKind::Throttled | ApiErrorKind::Transient
        )
    }
}

/// Result type alias for provider core operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("Configuration source error: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(ApiError::NotFound("x".into()).kind(), ApiErrorKind::NotFound);
        assert_eq!(
            ApiError::PreconditionFailed("x".into()).kind(),
            ApiErrorKind::PreconditionFailed
        );
        assert_eq!(ApiError::Cancelled("x".into()).kind(), ApiErrorKind::Cancelled);
    }

    #[test]
    fn new_round_trips_every_kind() {
        for kind in [
            ApiErrorKind::NotFound,
            ApiErrorKind::Conflict,
            ApiErrorKind::PreconditionFailed,
            ApiErrorKind::Throttled,
            ApiErrorKind::Transient,
            ApiErrorKind::Fatal,
            ApiErrorKind::Cancelled,
        ] {
            let err = ApiError::new(kind, "boom");
            assert_eq!(err.kind(), kind);
            assert_eq!(err.message(), "boom");
        }
    }

    #[test]
    fn retry_eligibility_differs_between_generic_and_delete_paths() {
        assert!(ApiError::Conflict(String::new()).is_retryable());
        assert!(ApiError::PreconditionFailed(String::new()).is_retryable());
        assert!(ApiError::Throttled(String::new()).is_retryable());
        assert!(!ApiError::Transient(String::new()).is_retryable());
        assert!(!ApiError::Fatal(String::new()).is_retryable());

        assert!(ApiError::Transient(String::new()).is_retryable_on_delete());
        assert!(ApiError::Conflict(String::new()).is_retryable_on_delete());
        assert!(!ApiError::PreconditionFailed(String::new()).is_retryable_on_delete());
        assert!(!ApiError::NotFound(String::new()).is_retryable_on_delete());
    }

    #[test]
    fn display_includes_category_prefix() {
        let err = ApiError::Throttled("slow down".into());
        assert_eq!(err.to_string(), "Throttled: slow down");
    }
}

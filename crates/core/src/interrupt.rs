//! Mapping from context interruption to the error taxonomy

use permsys_common::Interrupted;
use permsys_domain::ApiError;

/// `Cancelled` error naming the operation that was interrupted.
pub fn cancelled(operation: &str, reason: Interrupted) -> ApiError {
    ApiError::Cancelled(format!("{operation}: {reason}"))
}

//! Conversions from external infrastructure errors into domain errors.

use permsys_domain::{ApiError, ConfigError};
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ApiError);

impl From<InfraError> for ApiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ApiError> for InfraError {
    fn from(value: ApiError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoApiError {
    fn into_api(self) -> ApiError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for HttpError {
    fn into_api(self) -> ApiError {
        if self.is_timeout() {
            return ApiError::Transient("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ApiError::Transient(format!("HTTP connection failure: {self}"));
        }

        // a request that could not even be assembled will never succeed
        if self.is_builder() {
            return ApiError::Fatal(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return ApiError::Transient(format!("failed to read response body: {self}"));
        }

        ApiError::Transient(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_api())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for JsonError {
    fn into_api(self) -> ApiError {
        ApiError::Fatal(format!("malformed JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_api())
    }
}

/* -------------------------------------------------------------------------- */
/* ConfigError → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for ConfigError {
    fn into_api(self) -> ApiError {
        ApiError::Fatal(self.to_string())
    }
}

impl From<ConfigError> for InfraError {
    fn from(value: ConfigError) -> Self {
        InfraError(value.into_api())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

//! Provider configuration supplied by the plugin host

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS};
use crate::errors::ConfigError;

/// Connection settings for the control-plane API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the control plane (e.g. `https://api.example.com`)
    pub host: String,
    /// Bearer token
    pub token: String,
    /// Value sent as `X-API-Version`
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderConfig {
    /// Configuration with the default API version and timeout.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            api_version: default_api_version(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the `X-API-Version` header value.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Per-request timeout, rounded down to whole seconds (at least one).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the host is not an http(s) URL, the token
    /// is empty, or the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        let url = url::Url::parse(&self.host)
            .map_err(|e| ConfigError::Invalid { field: "host", message: e.to_string() })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "host",
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("token"));
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Missing("api_version"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_deserializing() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"host":"https://api.example.com","token":"t"}"#).unwrap();
        assert_eq!(config.api_version, "25r1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_missing_token_and_bad_scheme() {
        let config = ProviderConfig::new("https://api.example.com", " ");
        assert_eq!(config.validate(), Err(ConfigError::Missing("token")));

        let config = ProviderConfig::new("ftp://api.example.com", "t");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "host", .. })));
    }

    #[test]
    fn debug_redacts_token() {
        let config = ProviderConfig::new("https://api.example.com", "super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

//! Configuration loader
//!
//! Loads provider configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PERMSYS_HOST`: Control-plane base URL (required)
//! - `PERMSYS_TOKEN`: Bearer token (required)
//! - `PERMSYS_API_VERSION`: Value sent as `X-API-Version` (default `25r1`)
//! - `PERMSYS_TIMEOUT_SECS`: Per-attempt request timeout (default 30)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./permsys.json` or `./permsys.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use permsys_domain::{ConfigError, ProviderConfig};

/// Control-plane base URL.
pub const ENV_HOST: &str = "PERMSYS_HOST";
/// Bearer token.
pub const ENV_TOKEN: &str = "PERMSYS_TOKEN";
/// Overrides the `X-API-Version` header.
pub const ENV_API_VERSION: &str = "PERMSYS_API_VERSION";
/// Per-request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PERMSYS_TIMEOUT_SECS";

type Result<T> = std::result::Result<T, ConfigError>;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns [`ConfigError`] if neither source yields a valid configuration.
pub fn load() -> Result<ProviderConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns [`ConfigError`] if a required variable is missing, a value does
/// not parse, or the result fails validation.
pub fn load_from_env() -> Result<ProviderConfig> {
    let host = env_var(ENV_HOST, "host")?;
    let token = env_var(ENV_TOKEN, "token")?;

    let mut config = ProviderConfig::new(host, token);
    if let Some(version) = env_opt(ENV_API_VERSION) {
        config = config.with_api_version(version);
    }
    if let Some(raw) = env_opt(ENV_TIMEOUT_SECS) {
        config.timeout_secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
            field: "timeout_secs",
            message: format!("{ENV_TIMEOUT_SECS}={raw}: {e}"),
        })?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. The format is
/// detected by extension (`.json` or `.toml`).
///
/// # Errors
/// Returns [`ConfigError`] if the file is missing, unreadable, malformed,
/// or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ProviderConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::Source(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConfigError::Source("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConfigError::Source(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<ProviderConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Source(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Source(format!("Invalid JSON format: {e}"))),
        _ => Err(ConfigError::Source(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["permsys.json", "permsys.toml", "config.json", "config.toml"];

    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter().flat_map(|dir| NAMES.iter().map(move |name| dir.join(name))).find(|p| p.exists())
}

fn env_var(key: &str, field: &'static str) -> Result<String> {
    env_opt(key).ok_or(ConfigError::Missing(field))
}

/// Set and non-blank
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

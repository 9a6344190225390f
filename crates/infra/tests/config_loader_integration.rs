//! Integration tests for configuration loader
//!
//! Loads a provider configuration from a file and drives a request through
//! the resulting transport.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use permsys_core::ResourceOrchestrator;
use permsys_domain::{Diagnostics, Role};
use permsys_infra::{config, Provider};
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Copy `contents` into a temp file carrying `extension`.
fn write_config(contents: &str, extension: &str) -> PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "host": "https://api.example.com",
            "token": "json-token",
            "api_version": "26r1",
            "timeout_secs": 10
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("config from JSON file");

    assert_eq!(config.host, "https://api.example.com");
    assert_eq!(config.token, "json-token");
    assert_eq!(config.api_version, "26r1");
    assert_eq!(config.timeout(), Duration::from_secs(10));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_malformed_toml_is_rejected() {
    let path = write_config("host = \"https://api.example.com\"\ntoken = ", "toml");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert!(err.to_string().contains("TOML"), "unexpected error: {err}");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_invalid_host_is_rejected() {
    let path = write_config("host = \"not a url\"\ntoken = \"t\"\n", "toml");

    assert!(config::load_from_file(Some(path.clone())).is_err());

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_loaded_config_drives_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ps/ps-1/access/roles/r-1"))
        .and(header("authorization", "Bearer file-token"))
        .and(header("x-api-version", "27r3"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let path = write_config(
        &format!("host = \"{}\"\ntoken = \"file-token\"\napi_version = \"27r3\"\n", server.uri()),
        "toml",
    );
    let config = config::load_from_file(Some(path.clone())).expect("config from TOML file");
    std::fs::remove_file(path).ok();

    let provider = Provider::isolated(config).expect("provider");
    let mut role = Role::new("ps-1", "reader").with_permission("read", "");
    role.meta.id = "r-1".into();
    let ctx = permsys_common::OperationContext::new().with_timeout(Duration::from_secs(5));
    let state = provider.roles.read(&ctx, role, &mut Diagnostics::new()).await.expect("read");

    assert!(state.is_none());
}

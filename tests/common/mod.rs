use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{MockServer, Request};

use ssobridge::config::ProviderConfig;
use ssobridge::{AuthService, ProviderClient, SessionIssuer};

pub const SIGNING_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const TOKEN_CODE: &str = "tc-integration-0001";

/// Provider configuration pointing at a mock server, with a short timeout.
#[allow(dead_code)]
pub fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        secret_key: "test-secret-key".to_string(),
        client_id: "client-123".to_string(),
        client_key: "client-key-456".to_string(),
        base_url: base_url.to_string(),
        timeout_ms: 200,
        ..ProviderConfig::default()
    }
}

#[allow(dead_code)]
pub fn provider_client(server: &MockServer) -> ProviderClient {
    ProviderClient::new(provider_config(&server.uri())).expect("failed to build provider client")
}

#[allow(dead_code)]
pub fn auth_service(server: &MockServer) -> Arc<AuthService<ProviderClient>> {
    let config = provider_config(&server.uri());
    let client = ProviderClient::new(config.clone()).expect("failed to build provider client");
    Arc::new(AuthService::new(
        client,
        SessionIssuer::new(SIGNING_SECRET),
        &config,
    ))
}

#[allow(dead_code)]
pub fn token_code_body() -> Value {
    json!({"code": 200, "data": {"token": {"token_code": TOKEN_CODE}}})
}

#[allow(dead_code)]
pub fn value_mismatch_body() -> Value {
    json!({"error": {"code": 407, "message": "Please provide correct body value!"}})
}

/// Requests the mock server received on `path`, in arrival order.
#[allow(dead_code)]
pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .filter(|request| request.url.path() == path)
        .collect()
}

#[allow(dead_code)]
pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("request body is JSON")
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

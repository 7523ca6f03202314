//! Shared fixtures for pipeline tests against mocked IBM endpoints

#![allow(dead_code)]

use overwatch_common::GatewayConfig;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/identity/token";
pub const GENERATION_PATH: &str = "/ml/v1/text/generation";
pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_PROJECT_ID: &str = "test-project";
pub const TEST_TOKEN: &str = "test-bearer-token";

/// Nothing listens on port 1, so connections are refused immediately
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/unreachable";

/// Config pointing both endpoints at `server`
pub fn test_config(server: &MockServer) -> GatewayConfig {
    test_config_with(
        &format!("{}{}", server.uri(), TOKEN_PATH),
        &format!("{}{}?version=2023-05-29", server.uri(), GENERATION_PATH),
    )
}

pub fn test_config_with(identity_url: &str, inference_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.credentials.api_key = TEST_API_KEY.to_string();
    config.credentials.project_id = TEST_PROJECT_ID.to_string();
    config.identity.url = identity_url.to_string();
    config.identity.timeout_secs = 2;
    config.inference.url = inference_url.to_string();
    config.inference.timeout_secs = 2;
    config
}

pub async fn mount_token_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TEST_TOKEN,
            "refresh_token": "not_supported",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": 1_700_003_600
        })))
        .mount(server)
        .await;
}

pub async fn mount_token_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "errorCode": "BXNIM0415E",
            "errorMessage": "Provided API key could not be found."
        })))
        .mount(server)
        .await;
}

pub async fn mount_generation_text(server: &MockServer, generated_text: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(generation_body(generated_text)))
        .mount(server)
        .await;
}

pub async fn mount_generation_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(GENERATION_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("model is overloaded"))
        .mount(server)
        .await;
}

pub fn generation_body(generated_text: &str) -> serde_json::Value {
    json!({
        "model_id": "ibm/granite-3-8b-instruct",
        "created_at": "2024-11-01T12:00:00.000Z",
        "results": [{
            "generated_text": generated_text,
            "generated_token_count": 24,
            "input_token_count": 180,
            "stop_reason": "stop_sequence"
        }]
    })
}

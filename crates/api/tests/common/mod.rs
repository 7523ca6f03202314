//! Shared fixtures for driving the router against mocked IBM endpoints

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use overwatch_api::{router, AppState};
use overwatch_assessor::RiskAssessor;
use overwatch_common::GatewayConfig;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/identity/token";
pub const GENERATION_PATH: &str = "/ml/v1/text/generation";

pub fn test_config(server: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.credentials.api_key = "test-api-key".to_string();
    config.credentials.project_id = "test-project".to_string();
    config.identity.url = format!("{}{}", server.uri(), TOKEN_PATH);
    config.inference.url = format!("{}{}?version=2023-05-29", server.uri(), GENERATION_PATH);
    config.identity.timeout_secs = 2;
    config.inference.timeout_secs = 2;
    config
}

pub fn test_router(server: &MockServer) -> Router {
    let assessor = RiskAssessor::from_config(&test_config(server)).unwrap();
    router(AppState::new(assessor))
}

pub async fn mount_token_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-bearer-token",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

pub async fn mount_generation_text(server: &MockServer, generated_text: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "generated_text": generated_text, "stop_reason": "stop_sequence" }]
        })))
        .mount(server)
        .await;
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

//! Key validation and catalog endpoint integration tests
//!
//! A key is only reported invalid when the provider clearly refused it.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{closed_port_url, constants::*, TestApp};

fn api_key(value: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(value),
    )
}

#[tokio::test]
async fn test_missing_key_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/models").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "API key is required"}));
}

#[tokio::test]
async fn test_unknown_provider_is_bad_request() {
    let app = TestApp::new().await;

    let (name, value) = api_key(TEST_OPENAI_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "mistral")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unknown provider: mistral");
}

#[tokio::test]
async fn test_openai_is_default_provider_and_lists_models() {
    let app = TestApp::new().await;
    app.openai.mock_list_models(TEST_OPENAI_KEY).await;

    let (name, value) = api_key(TEST_OPENAI_KEY);
    let response = app.server.get("/api/models").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["models"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_openai_key_format_checked_before_network() {
    let app = TestApp::new().await;

    let (name, value) = api_key("not-an-openai-key");
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "openai")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid OpenAI API key format");
    assert!(app.openai.received_bodies().await.is_empty());
}

#[tokio::test]
async fn test_openai_rejected_key_is_unauthorized() {
    let app = TestApp::new().await;
    app.openai.mock_list_models_unauthorized().await;

    let (name, value) = api_key(TEST_OPENAI_KEY);
    let response = app.server.get("/api/models").add_header(name, value).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Incorrect API key provided");
}

#[tokio::test]
async fn test_gemini_key_valid_when_models_listed() {
    let app = TestApp::new().await;
    app.google.mock_list_models_status(200).await;

    let (name, value) = api_key(TEST_GEMINI_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "gemini")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"valid": true, "provider": "gemini"}));
}

#[tokio::test]
async fn test_gemini_quota_error_still_counts_as_valid() {
    let app = TestApp::new().await;
    app.google.mock_list_models_status(403).await;
    app.google
        .mock_generate_content_error("gemini-1.5-flash", 429, "Resource has been exhausted")
        .await;

    let (name, value) = api_key(TEST_GEMINI_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "gemini")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn test_gemini_invalid_key_is_rejected() {
    let app = TestApp::new().await;
    app.google.mock_list_models_status(400).await;
    app.google
        .mock_generate_content_error(
            "gemini-1.5-flash",
            400,
            "API key not valid. Please pass a valid API key.",
        )
        .await;

    let (name, value) = api_key(TEST_GEMINI_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "gemini")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "API key not valid. Please pass a valid API key."
    );
}

#[tokio::test]
async fn test_gemini_unreachable_counts_as_valid() {
    let app = TestApp::with_endpoints(|endpoints| endpoints.gemini = closed_port_url()).await;

    let (name, value) = api_key(TEST_GEMINI_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "gemini")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"valid": true, "provider": "gemini"}));
}

#[tokio::test]
async fn test_gemini_short_key_rejected_without_probe() {
    let app = TestApp::new().await;

    let (name, value) = api_key("AIza-short");
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "gemini")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "API key too short");
}

#[tokio::test]
async fn test_claude_forbidden_is_invalid() {
    let app = TestApp::new().await;
    app.anthropic.mock_messages_status(403).await;

    let (name, value) = api_key(TEST_CLAUDE_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "claude")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid Claude API key");
}

#[tokio::test]
async fn test_claude_server_error_is_not_a_rejection() {
    let app = TestApp::new().await;
    app.anthropic.mock_messages_status(500).await;

    let (name, value) = api_key(TEST_CLAUDE_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "claude")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"valid": true, "provider": "claude"}));
}

#[tokio::test]
async fn test_claude_unreachable_is_invalid() {
    let app = TestApp::with_endpoints(|endpoints| endpoints.anthropic = closed_port_url()).await;

    let (name, value) = api_key(TEST_CLAUDE_KEY);
    let response = app
        .server
        .get("/api/models")
        .add_query_param("provider", "claude")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Invalid Claude API key"}));
}

#[tokio::test]
async fn test_catalog_lists_chat_and_image_models() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/catalog").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["default_model"], "gpt-4o-mini");
    assert!(body["chat"]
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["provider"] == "gemini"));
    let dalle3 = body["image"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == "dall-e-3")
        .unwrap();
    assert_eq!(
        dalle3["sizes"],
        json!(["1024x1024", "1024x1792", "1792x1024"])
    );
}

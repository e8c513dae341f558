//! Health, metrics and docs endpoint integration tests

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_endpoint_returns_proper_structure() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_liveness_and_readiness_probes() {
    let app = TestApp::new().await;

    for probe in ["/health/live", "/health/ready"] {
        let response = app.server.get(probe).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy", "probe {}", probe);
    }
}

#[tokio::test]
async fn test_health_endpoints_reject_post() {
    let app = TestApp::new().await;

    let response = app.server.post("/health").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let app = TestApp::new().await;

    let response = app
        .server
        .method(axum::http::Method::OPTIONS, "/api/chat")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://localhost:3000"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("POST"),
        )
        .await;

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_docs_open_without_configured_key() {
    let app = TestApp::new().await;

    let response = app.server.get("/docs/openapi.json").await;
    response.assert_status_ok();
    let spec: Value = response.json();
    assert!(spec["paths"]["/api/chat"].is_object());

    let html = app.server.get("/docs").await;
    html.assert_status_ok();
    assert!(html.text().contains("/docs/openapi.json"));
}

#[tokio::test]
async fn test_docs_hidden_without_matching_key() {
    let app = TestApp::with_docs_key(Some("docs-secret")).await;

    app.server
        .get("/docs/openapi.json")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get("/docs")
        .add_header(
            HeaderName::from_static("x-docs-key"),
            HeaderValue::from_static("wrong"),
        )
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get("/docs/openapi.json")
        .add_header(
            HeaderName::from_static("x-docs-key"),
            HeaderValue::from_static("docs-secret"),
        )
        .await
        .assert_status_ok();
}

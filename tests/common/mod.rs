//! Common test utilities for Switchboard
//!
//! Builds the real router against mock upstreams so integration tests run the
//! full request path: credentials middleware, dispatch, adapters and stream
//! translation.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use switchboard::{routes, AppState, Config, UpstreamEndpoints};

use crate::mocks::{MockAnthropic, MockGoogle, MockOpenAI};

/// Test credentials
pub mod constants {
    pub const TEST_OPENAI_KEY: &str = "sk-test-openai-key";
    pub const TEST_GEMINI_KEY: &str = "AIzaSyTest0123456789abcdefghij";
    pub const TEST_CLAUDE_KEY: &str = "sk-ant-api03-test-key";
    pub const TEST_PROJECT: &str = "switchboard-test";
    pub const TEST_LOCATION: &str = "us-central1";
    /// "PNG" in base64
    pub const TINY_PNG_B64: &str = "iVBORw0KGgo=";
}

/// Service account fixture as a string
pub fn service_account_json() -> String {
    include_str!("../fixtures/service_account.json").to_string()
}

/// Full application wired to mock upstreams
pub struct TestApp {
    pub server: TestServer,
    pub openai: MockOpenAI,
    pub google: MockGoogle,
    pub anthropic: MockAnthropic,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_docs_key(None).await
    }

    /// Application whose docs are protected by `docs_key`
    pub async fn with_docs_key(docs_key: Option<&str>) -> Self {
        Self::build(docs_key, |_| {}).await
    }

    /// Application whose upstream URLs are adjusted after pointing them at
    /// the mocks
    pub async fn with_endpoints(adjust: impl FnOnce(&mut UpstreamEndpoints)) -> Self {
        Self::build(None, adjust).await
    }

    async fn build(docs_key: Option<&str>, adjust: impl FnOnce(&mut UpstreamEndpoints)) -> Self {
        let openai = MockOpenAI::start().await;
        let google = MockGoogle::start().await;
        let anthropic = MockAnthropic::start().await;

        let mut endpoints = UpstreamEndpoints {
            openai: openai.uri(),
            gemini: google.uri(),
            anthropic: anthropic.uri(),
            google_token: google.token_uri(),
            vertex: Some(google.vertex_uri()),
        };
        adjust(&mut endpoints);

        let mut config = Config::with_endpoints(endpoints);
        config.docs_api_key = docs_key.map(str::to_string);

        let state = Arc::new(AppState::new(config).expect("Failed to create app state"));
        let server =
            TestServer::new(routes::create_router(state)).expect("Failed to create test server");

        Self {
            server,
            openai,
            google,
            anthropic,
        }
    }
}

/// Base URL of a local port with nothing listening on it
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Split an SSE body into its `data:` payloads
pub fn sse_payloads(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter_map(|event| event.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}

/// Concatenate the text deltas of a normalized SSE body
pub fn sse_text(body: &str) -> String {
    sse_payloads(body)
        .iter()
        .filter(|p| p.as_str() != "[DONE]")
        .filter_map(|p| serde_json::from_str::<serde_json::Value>(p).ok())
        .filter_map(|v| {
            v.pointer("/choices/0/delta/content")
                .and_then(|c| c.as_str())
                .map(str::to_string)
        })
        .collect()
}

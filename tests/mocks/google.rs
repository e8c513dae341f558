//! Mock Google APIs
//!
//! One server plays all three Google upstreams:
//! - POST /models/{model}:generateContent and :streamGenerateContent - Gemini
//! - GET /models - Gemini model list (key probe)
//! - POST /token - OAuth2 token endpoint (JWT-bearer grant)
//! - POST /v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict - Imagen

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_ACCESS_TOKEN: &str = "ya29.test-access-token";

pub struct MockGoogle {
    server: MockServer,
}

impl MockGoogle {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Base URL to use as the fixed Vertex AI endpoint
    pub fn vertex_uri(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    /// Token endpoint URL
    pub fn token_uri(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    /// Bodies received on one path, parsed as JSON
    pub async fn received_json(&self, request_path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Raw bodies received on one path
    pub async fn received_text(&self, request_path: &str) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
            .collect()
    }

    // =========================================================================
    // Gemini
    // =========================================================================

    pub async fn mock_generate_content(&self, model: &str, key: &str, text: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .and(query_param("key", key))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": text}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 7,
                    "candidatesTokenCount": 5,
                    "totalTokenCount": 12
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Streamed answer, one SSE event per delta, CRLF framed
    pub async fn mock_stream_generate_content(&self, model: &str, deltas: &[&str]) {
        let mut body = String::new();
        for delta in deltas {
            let event = json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": delta}]}}]
            });
            body.push_str(&format!("data: {}\r\n\r\n", event));
        }

        Mock::given(method("POST"))
            .and(path(format!("/models/{}:streamGenerateContent", model)))
            .and(query_param("alt", "sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/event-stream"),
            )
            .mount(&self.server)
            .await;
    }

    /// Any Gemini generateContent call fails with a Google-style error
    pub async fn mock_generate_content_error(&self, model: &str, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"code": status, "message": message, "status": "FAILED"}
            })))
            .mount(&self.server)
            .await;
    }

    /// Image answer with one PNG part and one text part
    pub async fn mock_generate_image(&self, model: &str, b64: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"text": "Here is your image"},
                        {"inlineData": {"mimeType": "image/png", "data": b64}}
                    ]}
                }]
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_list_models_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"models": []})))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // OAuth2 + Vertex AI
    // =========================================================================

    pub async fn mock_token_exchange(&self) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_token_exchange_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#,
            ))
            .mount(&self.server)
            .await;
    }

    pub fn predict_path(project: &str, location: &str, model: &str) -> String {
        format!(
            "/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            project, location, model
        )
    }

    pub async fn mock_predict(&self, project: &str, location: &str, model: &str, response: Value) {
        Mock::given(method("POST"))
            .and(path(Self::predict_path(project, location, model)))
            .and(header(
                "Authorization",
                format!("Bearer {}", TEST_ACCESS_TOKEN).as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }
}

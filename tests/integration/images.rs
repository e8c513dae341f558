//! Image endpoint integration tests
//!
//! - DALL-E generation and size validation
//! - Gemini native image generation
//! - Imagen on Vertex AI with the service-account token exchange

use axum::http::{HeaderName, HeaderValue, StatusCode};
use base64::Engine as _;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{constants::*, service_account_json, TestApp};
use crate::mocks::MockGoogle;

const IMAGEN_MODEL: &str = "imagen-3.0-generate-002";

fn header(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

#[tokio::test]
async fn test_dalle_without_key_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/images")
        .json(&json!({"prompt": "a cat", "model": "dall-e-3"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "OpenAI API key is required"}));
}

#[tokio::test]
async fn test_missing_prompt_is_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/images")
        .json(&json!({"model": "dall-e-3"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Prompt and model are required");
}

#[tokio::test]
async fn test_dalle_generation_returns_data_uri() {
    let app = TestApp::new().await;
    app.openai.mock_image_generation_b64(TINY_PNG_B64).await;

    let (name, value) = header("x-api-key", TEST_OPENAI_KEY);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({
            "prompt": "a calm lake",
            "model": "dall-e-3",
            "size": "1792x1024",
            "quality": "hd",
            "style": "natural"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["created"], 1717000000);
    assert_eq!(
        body["images"][0]["url"],
        format!("data:image/png;base64,{}", TINY_PNG_B64)
    );
    assert_eq!(body["images"][0]["revised_prompt"], "a calm lake at dawn");

    let sent = app.openai.received_bodies().await;
    assert_eq!(sent[0]["quality"], "hd");
    assert_eq!(sent[0]["style"], "natural");
    assert_eq!(sent[0]["n"], 1);
}

#[tokio::test]
async fn test_dalle2_drops_dalle3_only_options() {
    let app = TestApp::new().await;
    app.openai.mock_image_generation_b64(TINY_PNG_B64).await;

    let (name, value) = header("x-api-key", TEST_OPENAI_KEY);
    app.server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({
            "prompt": "a calm lake",
            "model": "dall-e-2",
            "size": "512x512",
            "quality": "hd"
        }))
        .await
        .assert_status_ok();

    let sent = app.openai.received_bodies().await;
    assert!(sent[0].get("quality").is_none());
    assert!(sent[0].get("style").is_none());
}

#[tokio::test]
async fn test_dalle_unsupported_size_is_rejected_before_upstream() {
    let app = TestApp::new().await;

    let (name, value) = header("x-api-key", TEST_OPENAI_KEY);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({"prompt": "a cat", "model": "dall-e-3", "size": "512x512"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Size 512x512 is not supported by dall-e-3"));
    assert!(app.openai.received_bodies().await.is_empty());
}

#[tokio::test]
async fn test_gemini_image_model_collects_inline_images() {
    let app = TestApp::new().await;
    let model = "gemini-2.0-flash-preview-image-generation";
    app.google.mock_generate_image(model, TINY_PNG_B64).await;

    let (name, value) = header("x-gemini-api-key", TEST_GEMINI_KEY);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({"prompt": "a red fox", "model": model}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0]["url"],
        format!("data:image/png;base64,{}", TINY_PNG_B64)
    );

    let sent = app
        .google
        .received_json(&format!("/models/{}:generateContent", model))
        .await;
    assert_eq!(
        sent[0]["generationConfig"]["responseModalities"],
        json!(["TEXT", "IMAGE"])
    );
}

#[tokio::test]
async fn test_gemini_image_model_requires_gemini_key() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/images")
        .json(&json!({"prompt": "a red fox", "model": "gemini-2.0-flash-exp"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("gemini-2.0-flash-exp"));
}

#[tokio::test]
async fn test_imagen_requires_project_and_service_account() {
    let app = TestApp::new().await;

    let (name, value) = header("x-vertex-project-id", TEST_PROJECT);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({"prompt": "a lighthouse", "model": IMAGEN_MODEL}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Vertex AI configuration required for Imagen"));
}

#[tokio::test]
async fn test_imagen_exchanges_token_and_predicts() {
    let app = TestApp::new().await;
    app.google.mock_token_exchange().await;
    app.google
        .mock_predict(
            TEST_PROJECT,
            TEST_LOCATION,
            IMAGEN_MODEL,
            json!({"predictions": [{"bytesBase64Encoded": TINY_PNG_B64, "mimeType": "image/png"}]}),
        )
        .await;

    let (name, value) = header("x-vertex-project-id", TEST_PROJECT);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({
            "prompt": "a lighthouse",
            "model": IMAGEN_MODEL,
            "size": "1792x1024",
            "vertexServiceAccount": service_account_json()
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["images"][0]["url"],
        format!("data:image/png;base64,{}", TINY_PNG_B64)
    );
    assert_eq!(body["images"][0]["revised_prompt"], "a lighthouse");

    // The assertion is an RS256 JWT issued by the service account
    let form = app.google.received_text("/token").await;
    assert_eq!(form.len(), 1);
    let assertion = form[0]
        .split('&')
        .find_map(|pair| pair.strip_prefix("assertion="))
        .unwrap();
    let claims_segment = assertion.split('.').nth(1).unwrap();
    let claims: Value = serde_json::from_slice(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(claims_segment)
            .unwrap(),
    )
    .unwrap();
    assert_eq!(
        claims["iss"],
        "imagen-tester@switchboard-test.iam.gserviceaccount.com"
    );
    assert_eq!(claims["aud"], "https://oauth2.googleapis.com/token");
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        3600
    );

    let predict = app
        .google
        .received_json(&MockGoogle::predict_path(TEST_PROJECT, TEST_LOCATION, IMAGEN_MODEL))
        .await;
    assert_eq!(predict[0]["instances"][0]["prompt"], "a lighthouse");
    assert_eq!(predict[0]["parameters"]["aspectRatio"], "16:9");
}

#[tokio::test]
async fn test_imagen_accepts_service_account_as_object() {
    let app = TestApp::new().await;
    app.google.mock_token_exchange().await;
    app.google
        .mock_predict(
            TEST_PROJECT,
            "europe-west4",
            IMAGEN_MODEL,
            json!({"predictions": [{"bytesBase64Encoded": TINY_PNG_B64}]}),
        )
        .await;

    let account: Value = serde_json::from_str(&service_account_json()).unwrap();
    let (project, project_value) = header("x-vertex-project-id", TEST_PROJECT);
    let (location, location_value) = header("x-vertex-location", "europe-west4");
    app.server
        .post("/api/images")
        .add_header(project, project_value)
        .add_header(location, location_value)
        .json(&json!({
            "prompt": "a lighthouse",
            "model": IMAGEN_MODEL,
            "vertexServiceAccount": account
        }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_imagen_rejects_location_that_is_not_a_region() {
    let app = TestApp::new().await;
    app.google.mock_token_exchange().await;

    let (project, project_value) = header("x-vertex-project-id", TEST_PROJECT);
    let (location, location_value) = header("x-vertex-location", "169.254.169.254/latest#");
    let response = app
        .server
        .post("/api/images")
        .add_header(project, project_value)
        .add_header(location, location_value)
        .json(&json!({
            "prompt": "a lighthouse",
            "model": IMAGEN_MODEL,
            "vertexServiceAccount": service_account_json()
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "Invalid Vertex AI location: 169.254.169.254/latest#"
    );
    assert!(app.google.received_text("/token").await.is_empty());
}

#[tokio::test]
async fn test_imagen_safety_block_is_reported() {
    let app = TestApp::new().await;
    app.google.mock_token_exchange().await;
    app.google
        .mock_predict(
            TEST_PROJECT,
            TEST_LOCATION,
            IMAGEN_MODEL,
            json!({"predictions": [{"raiFilteredReason": "Prompt contains blocked words"}]}),
        )
        .await;

    let (name, value) = header("x-vertex-project-id", TEST_PROJECT);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({
            "prompt": "something disallowed",
            "model": IMAGEN_MODEL,
            "vertexServiceAccount": service_account_json()
        }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "Image blocked by safety filter: Prompt contains blocked words"
    );
}

#[tokio::test]
async fn test_imagen_token_exchange_failure() {
    let app = TestApp::new().await;
    app.google.mock_token_exchange_rejected().await;

    let (name, value) = header("x-vertex-project-id", TEST_PROJECT);
    let response = app
        .server
        .post("/api/images")
        .add_header(name, value)
        .json(&json!({
            "prompt": "a lighthouse",
            "model": IMAGEN_MODEL,
            "vertexServiceAccount": service_account_json()
        }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to get access token: "));
    assert!(body["error"].as_str().unwrap().contains("invalid_grant"));
}

//! Imagen on Vertex AI
//!
//! Authenticates with a caller-supplied service-account key: a signed RS256
//! assertion is exchanged for an access token through the OAuth2 JWT-bearer
//! grant. A fresh token is minted for every call and never cached.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    api::{GeneratedImage, ImageGenerationResponse, ImageRequest, Provider},
    error::{AppError, AppResult},
    proxy::{
        headers::bearer_json_headers,
        logging::RequestContext,
        provider::{parse_json_body, send, upstream_error, ImageProvider},
    },
};

/// Audience of the assertion, fixed by Google
pub const TOKEN_AUDIENCE: &str = "https://oauth2.googleapis.com/token";
/// OAuth2 scope requested for Vertex AI
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
/// Assertion lifetime in seconds
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The parts of a service-account key file we use
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    /// PKCS8 PEM private key
    pub private_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccount {
    pub fn from_json(text: &str) -> AppResult<Self> {
        let account: ServiceAccount = serde_json::from_str(text)
            .map_err(|e| AppError::TokenExchange(format!("invalid service account JSON: {}", e)))?;
        if account.client_email.trim().is_empty() || account.private_key.trim().is_empty() {
            return Err(AppError::TokenExchange(
                "service account JSON needs client_email and private_key".to_string(),
            ));
        }
        Ok(account)
    }
}

/// Claims of the JWT-bearer assertion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
}

impl AssertionClaims {
    pub fn new(account: &ServiceAccount, iat: i64) -> Self {
        Self {
            iss: account.client_email.clone(),
            sub: account.client_email.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
        }
    }
}

/// Sign the assertion: `base64url(header).base64url(claims).base64url(sig)`
/// with RSASSA-PKCS1-v1_5 over SHA-256.
pub fn build_assertion(account: &ServiceAccount, iat: i64) -> AppResult<String> {
    let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
        .map_err(|e| AppError::TokenExchange(format!("invalid private key: {}", e)))?;
    let claims = AssertionClaims::new(account, iat);
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| AppError::TokenExchange(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a service account for an access token
pub async fn fetch_access_token(
    client: &Client,
    token_url: &str,
    account: &ServiceAccount,
    ctx: &RequestContext,
) -> AppResult<String> {
    let assertion = build_assertion(account, Utc::now().timestamp())?;

    let builder = client
        .post(token_url)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())]);
    let response = send(client, builder, ctx).await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(AppError::TokenExchange(text));
    }

    serde_json::from_str::<TokenResponse>(&text)
        .map(|t| t.access_token)
        .map_err(|e| AppError::TokenExchange(format!("unexpected token response: {}", e)))
}

/// Imagen aspect ratio for a requested size; unknown sizes get `1:1`
pub fn aspect_ratio(size: &str) -> &'static str {
    match size {
        "1024x1024" | "1536x1536" => "1:1",
        "1024x1792" | "768x1344" => "9:16",
        "1792x1024" | "1344x768" => "16:9",
        "1024x1536" | "768x1024" => "3:4",
        "1536x1024" | "1024x768" => "4:3",
        _ => "1:1",
    }
}

/// `:predict` request body
pub fn predict_body(prompt: &str, size: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": aspect_ratio(size),
            "personGeneration": "allow_adult",
            "safetySetting": "block_some"
        }
    })
}

/// Read images out of a `:predict` answer.
///
/// A `raiFilteredReason` on any prediction fails the whole request.
pub fn extract_predictions(body: &Value, prompt: &str) -> AppResult<Vec<GeneratedImage>> {
    let predictions = body
        .get("predictions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut images = Vec::new();
    for prediction in predictions {
        if let Some(reason) = prediction.get("raiFilteredReason").and_then(Value::as_str) {
            return Err(AppError::ContentBlocked(format!(
                "Image blocked by safety filter: {}",
                reason
            )));
        }
        if let Some(data) = prediction.get("bytesBase64Encoded").and_then(Value::as_str) {
            images.push(GeneratedImage {
                url: format!("data:image/png;base64,{}", data),
                revised_prompt: Some(prompt.to_string()),
            });
        }
    }

    if !images.is_empty() {
        return Ok(images);
    }

    let blocked = body
        .pointer("/predictions/0/safetyAttributes/blocked")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if blocked {
        return Err(AppError::ContentBlocked(
            "Content blocked by safety filters".to_string(),
        ));
    }
    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(AppError::ContentBlocked(reason.to_string()));
    }

    Err(AppError::UpstreamProtocol(
        "No images generated. The model may have rejected the prompt.".to_string(),
    ))
}

/// Imagen adapter bound to one project and service account
pub struct ImagenImages {
    vertex_base: String,
    token_url: String,
    project_id: String,
    location: String,
    service_account: ServiceAccount,
}

impl ImagenImages {
    pub fn new(
        vertex_base: impl Into<String>,
        token_url: impl Into<String>,
        project_id: impl Into<String>,
        location: impl Into<String>,
        service_account: ServiceAccount,
    ) -> Self {
        Self {
            vertex_base: vertex_base.into(),
            token_url: token_url.into(),
            project_id: project_id.into(),
            location: location.into(),
            service_account,
        }
    }

    pub fn predict_url(&self, model: &str) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.vertex_base, self.project_id, self.location, model
        )
    }
}

#[async_trait]
impl ImageProvider for ImagenImages {
    fn provider(&self) -> Provider {
        Provider::Imagen
    }

    async fn generate(
        &self,
        client: &Client,
        request: &ImageRequest,
        ctx: &RequestContext,
    ) -> AppResult<ImageGenerationResponse> {
        let token = fetch_access_token(client, &self.token_url, &self.service_account, ctx).await?;

        let builder = client
            .post(self.predict_url(&request.model))
            .headers(bearer_json_headers(&token)?)
            .json(&predict_body(&request.prompt, &request.size));
        let response = send(client, builder, ctx).await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(upstream_error(Provider::Imagen, status, &text));
        }

        let body = parse_json_body(&text, Provider::Imagen)?;
        Ok(ImageGenerationResponse {
            images: extract_predictions(&body, &request.prompt)?,
            created: Utc::now().timestamp(),
        })
    }
}

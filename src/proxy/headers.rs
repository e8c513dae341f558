//! Header builders for upstream provider requests
//!
//! Only the headers built here reach a provider: nothing from the incoming
//! client request is forwarded.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{AppError, AppResult};

/// Anthropic API version sent with every Claude request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

fn secret_value(secret: &str) -> AppResult<HeaderValue> {
    let mut value = HeaderValue::from_str(secret)
        .map_err(|_| AppError::BadRequest("Credential contains invalid characters".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// `Authorization: Bearer <token>` plus a JSON content type
pub fn bearer_json_headers(token: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, secret_value(&format!("Bearer {}", token))?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Headers for the Anthropic messages API
pub fn anthropic_headers(api_key: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-api-key"), secret_value(api_key)?);
    headers.insert(
        HeaderName::from_static("anthropic-version"),
        HeaderValue::from_static(ANTHROPIC_VERSION),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

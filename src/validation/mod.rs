//! Credential validation
//!
//! One lightweight probe per provider. The probes only reject a key when the
//! provider clearly refused it: quota, region or policy failures leave the
//! key valid so that a usable key is never turned away.

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    api::{KeyValidationResponse, Provider},
    config::UpstreamEndpoints,
    error::{AppError, AppResult},
    proxy::{anthropic, gemini, openai, provider::send, RequestContext},
};

/// Shortest key accepted as a Gemini key
pub const MIN_GEMINI_KEY_LEN: usize = 20;

/// Outcome of a probe that never fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
}

/// Format check run before any network call
pub fn precheck(provider: Provider, key: &str) -> AppResult<()> {
    let ok = match provider {
        Provider::OpenAi => key.starts_with("sk-"),
        Provider::Claude => key.starts_with("sk-ant-"),
        Provider::Gemini => {
            if key.len() < MIN_GEMINI_KEY_LEN {
                return Err(AppError::InvalidCredential("API key too short".to_string()));
            }
            true
        }
        Provider::Imagen => {
            return Err(AppError::BadRequest(
                "Key validation is not available for imagen".to_string(),
            ))
        }
    };

    if ok {
        Ok(())
    } else {
        Err(AppError::InvalidCredential(format!(
            "Invalid {} API key format",
            provider.display_name()
        )))
    }
}

/// Whether a failed Gemini probe means the key itself was refused
pub fn gemini_rejects_key(status: u16, message: &str) -> bool {
    status == 401 || message.contains("API key not valid") || message.contains("API_KEY_INVALID")
}

/// Probe a Gemini key: list models, then a one-token generation.
///
/// Network failures count as valid.
pub async fn probe_gemini(
    client: &Client,
    base_url: &str,
    key: &str,
    ctx: &RequestContext,
) -> Verdict {
    match send(client, gemini::list_models_request(client, base_url, key), ctx).await {
        Ok(response) if response.status().is_success() => return Verdict::Valid,
        Ok(_) => {}
        Err(e) => {
            ctx.log_warning(&format!("Gemini validation exception, accepting key: {}", e));
            return Verdict::Valid;
        }
    }

    let response = match send(client, gemini::probe_generate_request(client, base_url, key), ctx).await {
        Ok(response) => response,
        Err(e) => {
            ctx.log_warning(&format!("Gemini validation exception, accepting key: {}", e));
            return Verdict::Valid;
        }
    };

    let status = response.status().as_u16();
    if response.status().is_success() {
        return Verdict::Valid;
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {}", status));

    if gemini_rejects_key(status, &message) {
        info!(status = %status, "Gemini key rejected");
        Verdict::Invalid(message)
    } else {
        warn!(status = %status, message = %message, "Gemini validation warning, accepting key");
        Verdict::Valid
    }
}

/// Probe a Claude key with a one-token message.
///
/// A 401 or 403 rejects the key. So does a failed call: unlike Gemini, a
/// Claude key that could not be checked is not accepted.
pub async fn probe_claude(
    client: &Client,
    base_url: &str,
    key: &str,
    ctx: &RequestContext,
) -> AppResult<Verdict> {
    let invalid = || Verdict::Invalid("Invalid Claude API key".to_string());

    let response = match send(client, anthropic::probe_request(client, base_url, key)?, ctx).await {
        Ok(response) => response,
        Err(e) => {
            ctx.log_warning(&format!("Claude validation exception, rejecting key: {}", e));
            return Ok(invalid());
        }
    };

    if anthropic::is_rejected(response.status().as_u16()) {
        Ok(invalid())
    } else {
        Ok(Verdict::Valid)
    }
}

/// Validate a key for a provider.
///
/// A refused key is [`AppError::InvalidCredential`]. OpenAI validation also
/// returns the models the key can see, and surfaces upstream failures as-is.
pub async fn validate_key(
    client: &Client,
    endpoints: &UpstreamEndpoints,
    provider: Provider,
    key: &str,
    ctx: &RequestContext,
) -> AppResult<KeyValidationResponse> {
    precheck(provider, key)?;

    let (verdict, models) = match provider {
        Provider::OpenAi => {
            let models = openai::list_models(client, &endpoints.openai, key, ctx).await?;
            (Verdict::Valid, Some(models))
        }
        Provider::Gemini => (probe_gemini(client, &endpoints.gemini, key, ctx).await, None),
        Provider::Claude => (probe_claude(client, &endpoints.anthropic, key, ctx).await?, None),
        Provider::Imagen => {
            return Err(AppError::BadRequest(
                "Key validation is not available for imagen".to_string(),
            ))
        }
    };

    match verdict {
        Verdict::Valid => Ok(KeyValidationResponse {
            valid: true,
            provider,
            models,
        }),
        Verdict::Invalid(message) => Err(AppError::InvalidCredential(message)),
    }
}

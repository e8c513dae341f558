//! Request types for the chat and image endpoints
//!
//! Wire bodies keep every field optional so that missing fields surface as a
//! `BadRequest` with a readable message instead of a deserialization failure.
//! `into_*` methods turn them into the normalized, validated request shapes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::ChatMessage;
use crate::error::{AppError, AppResult};

/// Chat request as posted to `/api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatRequestBody {
    /// Conversation so far, oldest first
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    /// Model identifier; selects the provider
    #[serde(default)]
    #[schema(example = "gemini-2.0-flash")]
    pub model: Option<String>,
    /// Whether to stream the response as server-sent events
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

/// Optional sampling parameters.
///
/// Adapters silently drop the ones their provider does not support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

/// Normalized, provider-agnostic chat request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub stream: bool,
    pub sampling: SamplingParams,
}

impl ChatRequestBody {
    /// Validate required fields and normalize
    pub fn into_request(self) -> AppResult<ChatRequest> {
        let model = self.model.filter(|m| !m.trim().is_empty());
        let (messages, model) = match (self.messages, model) {
            (Some(messages), Some(model)) => (messages, model),
            _ => {
                return Err(AppError::BadRequest(
                    "Messages and model are required".to_string(),
                ))
            }
        };

        Ok(ChatRequest {
            messages,
            model,
            stream: self.stream,
            sampling: SamplingParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                top_p: self.top_p,
                frequency_penalty: self.frequency_penalty,
                presence_penalty: self.presence_penalty,
            },
        })
    }
}

/// Default image size when the caller omits one
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// Image request as posted to `/api/images`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImageRequestBody {
    /// Text prompt describing the image
    #[serde(default)]
    #[schema(example = "a cat")]
    pub prompt: Option<String>,
    /// Image model identifier; selects the provider
    #[serde(default)]
    #[schema(example = "dall-e-3")]
    pub model: Option<String>,
    /// Requested size, e.g. `1024x1024`
    #[serde(default)]
    #[schema(example = "1024x1024")]
    pub size: Option<String>,
    /// `standard` or `hd` (DALL-E 3 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// `vivid` or `natural` (DALL-E 3 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Number of images (OpenAI only, defaults to 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Vertex AI service-account key, either as the JSON document or as a
    /// string containing it. Sent in the body because it is too large for a
    /// header.
    #[serde(
        default,
        rename = "vertexServiceAccount",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Object>)]
    pub vertex_service_account: Option<serde_json::Value>,
}

/// Normalized image generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub size: String,
    pub quality: Option<String>,
    pub style: Option<String>,
    pub n: u32,
}

impl ImageRequestBody {
    /// Validate required fields and normalize.
    ///
    /// Returns the request together with the raw service-account JSON text,
    /// which only the Imagen adapter consumes.
    pub fn into_request(self) -> AppResult<(ImageRequest, Option<String>)> {
        let prompt = self.prompt.filter(|p| !p.trim().is_empty());
        let model = self.model.filter(|m| !m.trim().is_empty());
        let (prompt, model) = match (prompt, model) {
            (Some(prompt), Some(model)) => (prompt, model),
            _ => {
                return Err(AppError::BadRequest(
                    "Prompt and model are required".to_string(),
                ))
            }
        };

        let service_account = match self.vertex_service_account {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(value @ serde_json::Value::Object(_)) => Some(value.to_string()),
            _ => None,
        };

        Ok((
            ImageRequest {
                prompt,
                model,
                size: self
                    .size
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
                quality: self.quality,
                style: self.style,
                n: self.n.unwrap_or(1).max(1),
            },
            service_account,
        ))
    }
}

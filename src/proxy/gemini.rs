//! Gemini adapter
//!
//! Translates normalized chat requests into `generateContent` calls, parses
//! the answers, and drives native Gemini image generation. The API key is
//! always sent as the `key` query parameter.

use async_trait::async_trait;
use base64::Engine as _;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    api::{
        AssistantMessage, ChatMessage, ChatRequest, ChatResponse, GeneratedImage,
        ImageGenerationResponse, ImageRequest, Provider, Role, Usage,
    },
    error::{AppError, AppResult},
    proxy::{
        logging::RequestContext,
        provider::{parse_json_body, send, upstream_error_message, ChatProvider, ImageProvider},
    },
    streaming::StreamDialect,
};

/// Temperature used when the caller does not set one
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Output token cap used when the caller does not set one
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentBody {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<&'static str>>,
}

/// Split a `data:<mime>;base64,<data>` URI into an inline-data part.
///
/// Returns `None` for remote URLs and for payloads that are not valid base64.
fn inline_image(uri: &str) -> Option<InlineData> {
    let (mime_type, data) = uri.strip_prefix("data:")?.split_once(";base64,")?;
    if base64::engine::general_purpose::STANDARD.decode(data).is_err() {
        debug!(mime_type = %mime_type, "Skipping image with invalid base64 payload");
        return None;
    }
    Some(InlineData {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}

fn message_parts(message: &ChatMessage) -> Vec<Part> {
    let images: Vec<Part> = message
        .image_urls()
        .iter()
        .filter_map(|url| match inline_image(url) {
            Some(inline_data) => Some(Part::InlineData { inline_data }),
            None => {
                debug!("Skipping non-inline image, Gemini only accepts data URIs");
                None
            }
        })
        .collect();

    let mut parts = Vec::with_capacity(images.len() + 1);
    if !message.content.is_empty() || images.is_empty() {
        parts.push(Part::Text {
            text: message.content.clone(),
        });
    }
    parts.extend(images);
    parts
}

/// Build the `generateContent` body for a chat request.
///
/// The first system message becomes `systemInstruction`; every system
/// message is left out of `contents`. Assistant turns map to role `model`.
/// Only temperature and the output token cap are supported.
pub fn build_chat_body(request: &ChatRequest) -> GenerateContentBody {
    let system_instruction = request
        .messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| Content {
            role: None,
            parts: vec![Part::Text {
                text: m.content.clone(),
            }],
        });

    let contents = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| Content {
            role: Some(if m.role == Role::Assistant { "model" } else { "user" }),
            parts: message_parts(m),
        })
        .collect();

    GenerateContentBody {
        contents,
        system_instruction,
        generation_config: GenerationConfig {
            temperature: Some(request.sampling.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            max_output_tokens: Some(
                request
                    .sampling
                    .max_tokens
                    .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            ),
            response_modalities: None,
        },
    }
}

/// Friendlier categories for Gemini error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiErrorClass {
    ModelNotFound,
    AccessDenied,
    QuotaExceeded,
}

/// Substrings (matched case-insensitively, first row wins) and the class
/// they select.
pub const ERROR_CLASSIFICATION: &[(&[&str], GeminiErrorClass)] = &[
    (&["not found", "does not exist"], GeminiErrorClass::ModelNotFound),
    (&["permission", "denied", "blocked"], GeminiErrorClass::AccessDenied),
    (&["quota", "limit"], GeminiErrorClass::QuotaExceeded),
];

impl GeminiErrorClass {
    pub fn classify(message: &str) -> Option<Self> {
        let lower = message.to_lowercase();
        ERROR_CLASSIFICATION
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map(|(_, class)| *class)
    }

    pub fn message(&self, model: &str) -> String {
        match self {
            GeminiErrorClass::ModelNotFound => {
                format!("Model {} not found. Try a different model.", model)
            }
            GeminiErrorClass::AccessDenied => {
                "Access denied. This model may not be available for your API key.".to_string()
            }
            GeminiErrorClass::QuotaExceeded => {
                "API quota exceeded. Please try again later.".to_string()
            }
        }
    }
}

/// Error for a failed Gemini call: the upstream message, rewritten when it
/// falls in a known class, with the upstream status
pub fn gemini_error(model: &str, status: u16, body: &str) -> AppError {
    let raw = upstream_error_message(Provider::Gemini, status, body);
    let message = match GeminiErrorClass::classify(&raw) {
        Some(class) => class.message(model),
        None => raw,
    };
    AppError::from_upstream_status(status, message)
}

fn usage_from(metadata: &Value) -> Usage {
    let count = |field: &str| {
        metadata
            .get(field)
            .and_then(Value::as_u64)
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
    };
    Usage {
        prompt_tokens: count("promptTokenCount"),
        completion_tokens: count("candidatesTokenCount"),
        total_tokens: count("totalTokenCount"),
    }
}

/// Gemini chat adapter
pub struct GeminiChat {
    base_url: String,
    api_key: String,
}

impl GeminiChat {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Endpoint for a model. Streaming uses `streamGenerateContent` with
    /// `alt=sse`.
    pub fn endpoint(&self, model: &str, stream: bool) -> String {
        let action = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        format!("{}/models/{}:{}", self.base_url, model, action)
    }
}

impl ChatProvider for GeminiChat {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn build_request(&self, client: &Client, request: &ChatRequest) -> AppResult<RequestBuilder> {
        let mut builder = client
            .post(self.endpoint(&request.model, request.stream))
            .query(&[("key", self.api_key.as_str())]);
        if request.stream {
            builder = builder.query(&[("alt", "sse")]);
        }
        Ok(builder.json(&build_chat_body(request)))
    }

    fn parse_response(&self, body: Value, request: &ChatRequest) -> AppResult<ChatResponse> {
        if body.pointer("/candidates/0").is_none() {
            if let Some(reason) = body
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
            {
                return Err(AppError::ContentBlocked(format!(
                    "Prompt blocked by Gemini: {}",
                    reason
                )));
            }
        }

        let content = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let now = Utc::now().timestamp_millis();
        Ok(ChatResponse {
            message: AssistantMessage {
                id: format!("gemini-{}", now),
                role: Role::Assistant,
                content,
                timestamp: now,
                model: request.model.clone(),
            },
            usage: body.get("usageMetadata").map(usage_from),
        })
    }

    fn stream_dialect(&self) -> StreamDialect {
        StreamDialect::Gemini
    }

    fn upstream_error(&self, status: u16, body: &str, request: &ChatRequest) -> AppError {
        gemini_error(&request.model, status, body)
    }
}

/// Request body for native image output
pub fn build_image_body(prompt: &str) -> GenerateContentBody {
    GenerateContentBody {
        contents: vec![Content {
            role: None,
            parts: vec![Part::Text {
                text: prompt.to_string(),
            }],
        }],
        system_instruction: None,
        generation_config: GenerationConfig {
            response_modalities: Some(vec!["TEXT", "IMAGE"]),
            ..GenerationConfig::default()
        },
    }
}

fn candidate_parts(body: &Value) -> impl Iterator<Item = &Value> {
    body.get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|c| c.pointer("/content/parts").and_then(Value::as_array))
        .flatten()
}

/// Collect every `image/*` inline part across all candidates.
///
/// With no image, the concatenated text parts become the error, since the
/// model most likely declined to draw.
pub fn extract_images(body: &Value, prompt: &str) -> AppResult<Vec<GeneratedImage>> {
    let images: Vec<GeneratedImage> = candidate_parts(body)
        .filter_map(|part| {
            let inline = part.get("inlineData")?;
            let mime = inline.get("mimeType")?.as_str()?;
            if !mime.starts_with("image/") {
                return None;
            }
            let data = inline.get("data")?.as_str()?;
            Some(GeneratedImage {
                url: format!("data:{};base64,{}", mime, data),
                revised_prompt: Some(prompt.to_string()),
            })
        })
        .collect();

    if !images.is_empty() {
        return Ok(images);
    }

    let text: String = candidate_parts(body)
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    Err(AppError::UpstreamProtocol(if text.is_empty() {
        "No images generated. The model may have rejected the prompt or returned text only."
            .to_string()
    } else {
        text
    }))
}

/// Gemini native image adapter
pub struct GeminiImages {
    base_url: String,
    api_key: String,
}

impl GeminiImages {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiImages {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(
        &self,
        client: &Client,
        request: &ImageRequest,
        ctx: &RequestContext,
    ) -> AppResult<ImageGenerationResponse> {
        let builder = client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&build_image_body(&request.prompt));

        let response = send(client, builder, ctx).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(gemini_error(&request.model, status, &text));
        }

        let body = parse_json_body(&text, Provider::Gemini)?;
        Ok(ImageGenerationResponse {
            images: extract_images(&body, &request.prompt)?,
            created: Utc::now().timestamp(),
        })
    }
}

/// Model used by the fallback validation probe
pub const PROBE_MODEL: &str = "gemini-1.5-flash";

/// `GET /models`: the cheap first validation probe
pub fn list_models_request(client: &Client, base_url: &str, api_key: &str) -> RequestBuilder {
    client
        .get(format!("{}/models", base_url))
        .query(&[("key", api_key)])
}

/// One-token `generateContent`: the fallback validation probe
pub fn probe_generate_request(client: &Client, base_url: &str, api_key: &str) -> RequestBuilder {
    let body = GenerateContentBody {
        contents: vec![Content {
            role: None,
            parts: vec![Part::Text {
                text: "Hi".to_string(),
            }],
        }],
        system_instruction: None,
        generation_config: GenerationConfig {
            max_output_tokens: Some(1),
            ..GenerationConfig::default()
        },
    };

    client
        .post(format!("{}/models/{}:generateContent", base_url, PROBE_MODEL))
        .query(&[("key", api_key)])
        .json(&body)
}

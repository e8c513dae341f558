//! OpenAI adapter
//!
//! Chat completions, DALL-E image generation and the model listing used for
//! key validation. OpenAI streams are already in the normalized chunk format
//! and go through the translator in pass-through mode.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    api::{
        catalog::openai_image_sizes, AssistantMessage, ChatMessage, ChatRequest, ChatResponse,
        GeneratedImage, ImageGenerationResponse, ImageRequest, Provider, Role, Usage,
    },
    error::{AppError, AppResult},
    proxy::{
        headers::bearer_json_headers,
        logging::RequestContext,
        provider::{read_json, send_checked, ChatProvider, ImageProvider},
    },
    streaming::StreamDialect,
};

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        let images = message.image_urls();
        let content = if images.is_empty() {
            WireContent::Text(&message.content)
        } else {
            let mut parts = vec![ContentPart::Text {
                text: &message.content,
            }];
            parts.extend(
                images.iter().map(|url| ContentPart::ImageUrl {
                    image_url: ImageUrl { url: url.as_str() },
                }),
            );
            WireContent::Parts(parts)
        };

        WireMessage {
            role: message.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat adapter
pub struct OpenAiChat {
    base_url: String,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// Upstream chat completions body for a normalized request
fn chat_body(request: &ChatRequest) -> ChatCompletionBody<'_> {
    ChatCompletionBody {
        model: &request.model,
        messages: request.messages.iter().map(WireMessage::from).collect(),
        stream: request.stream,
        temperature: request.sampling.temperature,
        max_tokens: request.sampling.max_tokens,
        top_p: request.sampling.top_p,
        frequency_penalty: request.sampling.frequency_penalty,
        presence_penalty: request.sampling.presence_penalty,
    }
}

impl ChatProvider for OpenAiChat {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn build_request(&self, client: &Client, request: &ChatRequest) -> AppResult<RequestBuilder> {
        Ok(client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(bearer_json_headers(&self.api_key)?)
            .json(&chat_body(request)))
    }

    fn parse_response(&self, body: Value, request: &ChatRequest) -> AppResult<ChatResponse> {
        let completion: ChatCompletion = serde_json::from_value(body).map_err(|e| {
            AppError::UpstreamProtocol(format!("Unexpected OpenAI response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::UpstreamProtocol("OpenAI response contained no choices".to_string())
            })?
            .message
            .content
            .unwrap_or_default();

        let now = Utc::now().timestamp_millis();
        Ok(ChatResponse {
            message: AssistantMessage {
                id: completion
                    .id
                    .unwrap_or_else(|| format!("openai-{}", now)),
                role: Role::Assistant,
                content,
                timestamp: now,
                model: completion.model.unwrap_or_else(|| request.model.clone()),
            },
            usage: completion.usage,
        })
    }

    fn stream_dialect(&self) -> StreamDialect {
        StreamDialect::OpenAi
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

/// Reject sizes a known DALL-E model would refuse
pub fn validate_image_size(model: &str, size: &str) -> AppResult<()> {
    match openai_image_sizes(model) {
        Some(sizes) if !sizes.contains(&size) => Err(AppError::BadRequest(format!(
            "Size {} is not supported by {}. Supported sizes: {}",
            size,
            model,
            sizes.join(", ")
        ))),
        _ => Ok(()),
    }
}

/// DALL-E image adapter
pub struct OpenAiImages {
    base_url: String,
    api_key: String,
}

impl OpenAiImages {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

fn image_body(request: &ImageRequest) -> ImageGenerationBody<'_> {
    // quality and style only exist on dall-e-3
    let dalle3 = request.model == "dall-e-3";
    ImageGenerationBody {
        model: &request.model,
        prompt: &request.prompt,
        size: &request.size,
        n: request.n,
        quality: request.quality.as_deref().filter(|_| dalle3),
        style: request.style.as_deref().filter(|_| dalle3),
    }
}

fn parse_images(body: Value) -> AppResult<ImageGenerationResponse> {
    let parsed: ImagesResponse = serde_json::from_value(body)
        .map_err(|e| AppError::UpstreamProtocol(format!("Unexpected OpenAI response: {}", e)))?;

    let images = parsed
        .data
        .into_iter()
        .filter_map(|image| {
            let url = match (image.url, image.b64_json) {
                (Some(url), _) => url,
                (None, Some(b64)) => format!("data:image/png;base64,{}", b64),
                (None, None) => return None,
            };
            Some(GeneratedImage {
                url,
                revised_prompt: image.revised_prompt,
            })
        })
        .collect();

    Ok(ImageGenerationResponse {
        images,
        created: parsed.created.unwrap_or_else(|| Utc::now().timestamp()),
    })
}

#[async_trait]
impl ImageProvider for OpenAiImages {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn generate(
        &self,
        client: &Client,
        request: &ImageRequest,
        ctx: &RequestContext,
    ) -> AppResult<ImageGenerationResponse> {
        validate_image_size(&request.model, &request.size)?;

        let builder = client
            .post(format!("{}/images/generations", self.base_url))
            .headers(bearer_json_headers(&self.api_key)?)
            .json(&image_body(request));

        let response = send_checked(client, builder, ctx).await?;
        let body = read_json(response, Provider::OpenAi).await?;
        parse_images(body)
    }
}

/// List the models visible to a key. Used as the OpenAI credential probe.
pub async fn list_models(
    client: &Client,
    base_url: &str,
    api_key: &str,
    ctx: &RequestContext,
) -> AppResult<Vec<Value>> {
    let builder = client
        .get(format!("{}/models", base_url))
        .headers(bearer_json_headers(api_key)?);

    let response = send_checked(client, builder, ctx).await?;
    let body = read_json(response, Provider::OpenAi).await?;
    let models = match body.get("data") {
        Some(Value::Array(models)) => models.clone(),
        _ => Vec::new(),
    };
    debug!(count = models.len(), "Listed OpenAI models");
    Ok(models)
}

//! Static catalog of the models the UI offers
//!
//! Image models carry the sizes their provider accepts; the image endpoint
//! uses the OpenAI entries to reject sizes DALL-E would refuse anyway.

use serde::Serialize;
use utoipa::ToSchema;

use super::types::Provider;

/// What a model is used for
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Chat,
    Image,
}

/// Catalog entry
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct ModelInfo {
    #[schema(value_type = String, example = "gpt-4o")]
    pub id: &'static str,
    #[schema(value_type = String, example = "GPT-4o")]
    pub name: &'static str,
    pub provider: Provider,
    pub kind: ModelKind,
    /// Context window in tokens (chat models)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    #[schema(value_type = String)]
    pub description: &'static str,
    /// Accepted sizes (image models)
    #[serde(skip_serializing_if = "no_sizes")]
    #[schema(value_type = Vec<String>)]
    pub sizes: &'static [&'static str],
}

fn no_sizes(sizes: &&'static [&'static str]) -> bool {
    sizes.is_empty()
}

/// Catalog response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub chat: Vec<ModelInfo>,
    pub image: Vec<ModelInfo>,
    #[schema(value_type = String, example = "gpt-4o-mini")]
    pub default_model: &'static str,
}

/// Model preselected by the UI
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DALLE2_SIZES: &[&str] = &["256x256", "512x512", "1024x1024"];
pub const DALLE3_SIZES: &[&str] = &["1024x1024", "1024x1792", "1792x1024"];
pub const GEMINI_IMAGE_SIZES: &[&str] = &["1024x1024", "1536x1536", "1024x1536", "1536x1024"];
pub const IMAGEN_SIZES: &[&str] = &["1024x1024", "768x1344", "1344x768", "768x1024", "1024x768"];

/// Imagen models served through Vertex AI
pub const IMAGEN_MODELS: &[&str] = &["imagen-3.0-generate-002", "imagen-3.0-fast-generate-001"];

const fn chat(
    id: &'static str,
    name: &'static str,
    provider: Provider,
    context_window: u32,
    description: &'static str,
) -> ModelInfo {
    ModelInfo {
        id,
        name,
        provider,
        kind: ModelKind::Chat,
        context_window: Some(context_window),
        description,
        sizes: &[],
    }
}

const fn image(
    id: &'static str,
    name: &'static str,
    provider: Provider,
    description: &'static str,
    sizes: &'static [&'static str],
) -> ModelInfo {
    ModelInfo {
        id,
        name,
        provider,
        kind: ModelKind::Image,
        context_window: None,
        description,
        sizes,
    }
}

const CHAT_MODELS: &[ModelInfo] = &[
    chat("gpt-4o", "GPT-4o", Provider::OpenAi, 128_000, "Most capable multimodal model"),
    chat("gpt-4o-mini", "GPT-4o Mini", Provider::OpenAi, 128_000, "Affordable and intelligent small model"),
    chat("chatgpt-4o-latest", "ChatGPT-4o Latest", Provider::OpenAi, 128_000, "Latest ChatGPT model with vision"),
    chat("gpt-4-turbo", "GPT-4 Turbo", Provider::OpenAi, 128_000, "Latest GPT-4 with vision"),
    chat("gpt-4", "GPT-4", Provider::OpenAi, 8_192, "Powerful general-purpose model"),
    chat("gpt-3.5-turbo", "GPT-3.5 Turbo", Provider::OpenAi, 16_385, "Fast and cost-effective"),
    chat("o1-preview", "O1 Preview", Provider::OpenAi, 128_000, "Reasoning model preview"),
    chat("o1-mini", "O1 Mini", Provider::OpenAi, 128_000, "Faster reasoning model"),
    chat("gemini-2.5-pro-preview-05-06", "Gemini 2.5 Pro", Provider::Gemini, 1_000_000, "Most advanced thinking model"),
    chat("gemini-2.5-flash-preview-05-20", "Gemini 2.5 Flash", Provider::Gemini, 1_000_000, "Fast adaptive thinking model"),
    chat("gemini-2.0-flash", "Gemini 2.0 Flash", Provider::Gemini, 1_000_000, "Latest stable multimodal model"),
    chat("gemini-2.0-flash-lite", "Gemini 2.0 Flash Lite", Provider::Gemini, 1_000_000, "Cost-effective and low latency"),
    chat("gemini-1.5-pro", "Gemini 1.5 Pro", Provider::Gemini, 2_000_000, "Complex reasoning tasks"),
    chat("gemini-1.5-flash", "Gemini 1.5 Flash", Provider::Gemini, 1_000_000, "Fast and versatile performance"),
    chat("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet", Provider::Claude, 200_000, "Most intelligent model"),
    chat("claude-3-5-haiku-20241022", "Claude 3.5 Haiku", Provider::Claude, 200_000, "Fastest model"),
    chat("claude-3-opus-20240229", "Claude 3 Opus", Provider::Claude, 200_000, "Powerful model for complex tasks"),
    chat("claude-3-sonnet-20240229", "Claude 3 Sonnet", Provider::Claude, 200_000, "Balanced performance"),
    chat("claude-3-haiku-20240307", "Claude 3 Haiku", Provider::Claude, 200_000, "Fast and compact"),
];

const IMAGE_MODELS: &[ModelInfo] = &[
    image("dall-e-2", "DALL-E 2", Provider::OpenAi, "Classic image generation", DALLE2_SIZES),
    image("dall-e-3", "DALL-E 3", Provider::OpenAi, "High fidelity images with prompt rewriting", DALLE3_SIZES),
    image(
        "gemini-2.0-flash-exp-image-generation",
        "Gemini 2.0 Flash (Image)",
        Provider::Gemini,
        "Native Gemini image output",
        GEMINI_IMAGE_SIZES,
    ),
    image(
        "gemini-2.0-flash-preview-image-generation",
        "Gemini 2.0 Flash Preview",
        Provider::Gemini,
        "Native Gemini image output (preview)",
        GEMINI_IMAGE_SIZES,
    ),
    image("imagen-3.0-generate-002", "Imagen 3", Provider::Imagen, "Imagen on Vertex AI", IMAGEN_SIZES),
    image("imagen-3.0-fast-generate-001", "Imagen 3 Fast", Provider::Imagen, "Faster Imagen on Vertex AI", IMAGEN_SIZES),
];

/// Known chat models
pub fn chat_models() -> &'static [ModelInfo] {
    CHAT_MODELS
}

/// Known image models
pub fn image_models() -> &'static [ModelInfo] {
    IMAGE_MODELS
}

/// Full catalog
pub fn catalog() -> CatalogResponse {
    CatalogResponse {
        chat: CHAT_MODELS.to_vec(),
        image: IMAGE_MODELS.to_vec(),
        default_model: DEFAULT_MODEL,
    }
}

/// Sizes accepted by an OpenAI image model, `None` for models we do not know
pub fn openai_image_sizes(model: &str) -> Option<&'static [&'static str]> {
    match model {
        "dall-e-2" => Some(DALLE2_SIZES),
        "dall-e-3" => Some(DALLE3_SIZES),
        _ => None,
    }
}

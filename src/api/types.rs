//! Core types shared by the chat, image and key-validation endpoints
//!
//! Defines message roles, chat messages and the provider identifiers every
//! adapter and the dispatcher agree on.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role of a message participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing instructions or context
    System,
    /// User message from the human
    User,
    /// Assistant message from the AI
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A chat message as sent by the UI.
///
/// The UI keeps its own bookkeeping fields (`id`, `timestamp`, `model`,
/// `tokens`) on every message. They are accepted and never sent upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ChatMessage {
    /// The role of the message author
    pub role: Role,
    /// The text content of the message
    #[serde(default)]
    #[schema(example = "hi")]
    pub content: String,
    /// Images attached to the message (remote URLs or `data:` URIs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
}

impl ChatMessage {
    /// Plain text message without UI bookkeeping
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: None,
            id: None,
            timestamp: None,
            model: None,
            tokens: None,
        }
    }

    /// Attached images, empty when none
    pub fn image_urls(&self) -> &[String] {
        self.images.as_deref().unwrap_or(&[])
    }
}

/// Upstream provider family
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI and OpenAI-compatible APIs
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini (Generative Language API)
    Gemini,
    /// Anthropic Claude
    Claude,
    /// Imagen on Vertex AI
    Imagen,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Claude => "claude",
            Provider::Imagen => "imagen",
        }
    }

    /// Human-readable provider name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Claude => "Claude",
            Provider::Imagen => "Imagen",
        }
    }

    /// Parse the `provider` query parameter of the key-validation endpoint
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "openai" => Some(Provider::OpenAi),
            "gemini" => Some(Provider::Gemini),
            "claude" => Some(Provider::Claude),
            "imagen" => Some(Provider::Imagen),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

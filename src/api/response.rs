//! Response types for the chat, image and key-validation endpoints
//!
//! Also defines the normalized streaming chunk every provider stream is
//! translated into.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{Provider, Role};

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Usage {
    /// Number of tokens in the prompt
    #[schema(example = 12)]
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    #[schema(example = 30)]
    pub completion_tokens: u32,
    /// Total tokens used
    #[schema(example = 42)]
    pub total_tokens: u32,
}

/// The generated assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AssistantMessage {
    /// Completion identifier (provider id when available)
    #[schema(example = "chatcmpl-abc123")]
    pub id: String,
    /// Always `assistant`
    pub role: Role,
    /// Generated text
    pub content: String,
    /// Unix timestamp in milliseconds
    #[schema(example = 1717000000000_i64)]
    pub timestamp: i64,
    /// Model that produced the message
    #[schema(example = "gemini-2.0-flash")]
    pub model: String,
}

/// Non-streaming chat response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ChatResponse {
    pub message: AssistantMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Streaming delta content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Delta {
    pub content: String,
}

/// Streaming choice with delta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StreamChoice {
    pub delta: Delta,
}

/// Normalized stream chunk: `{"choices":[{"delta":{"content":"..."}}]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

impl StreamChunk {
    /// Chunk carrying a single text delta
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![StreamChoice {
                delta: Delta {
                    content: content.into(),
                },
            }],
        }
    }
}

/// A generated image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GeneratedImage {
    /// Remote URL or `data:` URI with the base64 image
    pub url: String,
    /// Prompt as rewritten by the provider, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Image generation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ImageGenerationResponse {
    pub images: Vec<GeneratedImage>,
    /// Unix timestamp in seconds
    #[schema(example = 1717000000)]
    pub created: i64,
}

/// Successful key validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct KeyValidationResponse {
    pub valid: bool,
    pub provider: Provider,
    /// Models visible to the key (OpenAI only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub models: Option<Vec<serde_json::Value>>,
}

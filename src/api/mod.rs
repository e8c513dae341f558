//! Public API types for Switchboard
//!
//! Request and response shapes of the chat, image and key-validation
//! endpoints, plus the static model catalog. These are the only shapes the UI
//! ever sees; provider wire formats stay inside the adapters.

pub mod catalog;
pub mod request;
pub mod response;
pub mod types;

// Re-export key types for convenience
pub use request::{ChatRequest, ChatRequestBody, ImageRequest, ImageRequestBody, SamplingParams};
pub use response::{
    AssistantMessage, ChatResponse, Delta, GeneratedImage, ImageGenerationResponse,
    KeyValidationResponse, StreamChoice, StreamChunk, Usage,
};
pub use types::{ChatMessage, Provider, Role};

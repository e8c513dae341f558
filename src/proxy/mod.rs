//! Proxy module
//!
//! Provider adapters, the model router and the plumbing shared by every
//! upstream call.

pub mod anthropic;
pub mod dispatch;
pub mod gemini;
pub mod headers;
pub mod logging;
pub mod openai;
pub mod provider;
pub mod vertex;

pub use dispatch::{chat_adapter, classify_chat_model, classify_image_model, image_adapter};
pub use logging::RequestContext;
pub use provider::{complete_chat, stream_chat, ByteStream, ChatProvider, ImageProvider};

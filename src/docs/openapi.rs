//! OpenAPI specification for the Switchboard API
//!
//! Aggregates all public endpoints and schemas into a single OpenAPI document.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    api::{
        catalog::{CatalogResponse, ModelInfo, ModelKind},
        AssistantMessage, ChatMessage, ChatRequestBody, ChatResponse, Delta, GeneratedImage,
        ImageGenerationResponse, ImageRequestBody, KeyValidationResponse, Provider, Role,
        StreamChoice, StreamChunk, Usage,
    },
    error::ErrorResponse,
};

/// OpenAPI specification for the Switchboard API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Switchboard API",
        version = "1.0.0",
        description = "One chat and image API over OpenAI, Gemini and Vertex AI Imagen, with a normalized streaming format"
    ),
    paths(
        crate::routes::chat::chat,
        crate::routes::images::generate_images,
        crate::routes::models::validate_api_key,
        crate::routes::models::model_catalog,
    ),
    components(
        schemas(
            // Types
            Role,
            Provider,
            ChatMessage,
            // Requests
            ChatRequestBody,
            ImageRequestBody,
            // Responses
            Usage,
            AssistantMessage,
            ChatResponse,
            Delta,
            StreamChoice,
            StreamChunk,
            GeneratedImage,
            ImageGenerationResponse,
            KeyValidationResponse,
            ModelKind,
            ModelInfo,
            CatalogResponse,
            // Error
            ErrorResponse,
        )
    ),
    modifiers(&CredentialHeaders),
    tags(
        (name = "Chat", description = "Chat with any supported model"),
        (name = "Images", description = "Image generation"),
        (name = "Keys", description = "Key validation and model catalog")
    )
)]
pub struct ApiDoc;

/// Provider credential headers as API key schemes
struct CredentialHeaders;

impl Modify for CredentialHeaders {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "openai_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
            );
            components.add_security_scheme(
                "gemini_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-gemini-api-key"))),
            );
        }
    }
}

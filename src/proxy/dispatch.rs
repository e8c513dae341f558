//! Request routing
//!
//! Classifies the requested model to exactly one provider, checks that the
//! caller supplied that provider's credential and builds the adapter. Model
//! names are only inspected here.

use crate::{
    api::{catalog::IMAGEN_MODELS, Provider},
    config::UpstreamEndpoints,
    error::{AppError, AppResult},
    middleware::ProviderCredentials,
    proxy::{
        gemini::{GeminiChat, GeminiImages},
        openai::{OpenAiChat, OpenAiImages},
        provider::{ChatProvider, ImageProvider},
        vertex::{ImagenImages, ServiceAccount},
    },
};

/// Provider serving a chat model: `gemini*` goes to Gemini, everything else
/// to OpenAI
pub fn classify_chat_model(model: &str) -> Provider {
    if model.starts_with("gemini") {
        Provider::Gemini
    } else {
        Provider::OpenAi
    }
}

/// Provider serving an image model: known Imagen ids go to Vertex AI,
/// `gemini-*` to Gemini, everything else to OpenAI
pub fn classify_image_model(model: &str) -> Provider {
    if IMAGEN_MODELS.contains(&model) {
        Provider::Imagen
    } else if model.starts_with("gemini-") {
        Provider::Gemini
    } else {
        Provider::OpenAi
    }
}

/// Whether a Vertex region can be placed in the regional hostname.
///
/// Regions are lowercase letters, digits and dashes (`us-central1`).
pub fn is_valid_vertex_location(location: &str) -> bool {
    !location.is_empty()
        && location
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Select the chat adapter for a model
pub fn chat_adapter(
    model: &str,
    credentials: &ProviderCredentials,
    endpoints: &UpstreamEndpoints,
) -> AppResult<Box<dyn ChatProvider>> {
    match classify_chat_model(model) {
        Provider::Gemini => {
            let key = credentials.gemini.as_deref().ok_or_else(|| {
                AppError::MissingCredential("Gemini API key is required".to_string())
            })?;
            Ok(Box::new(GeminiChat::new(endpoints.gemini.as_str(), key)))
        }
        _ => {
            let key = credentials
                .openai
                .as_deref()
                .ok_or_else(|| AppError::MissingCredential("API key is required".to_string()))?;
            Ok(Box::new(OpenAiChat::new(endpoints.openai.as_str(), key)))
        }
    }
}

/// Select the image adapter for a model.
///
/// `service_account` is the raw key JSON from the request body, needed for
/// Imagen only.
pub fn image_adapter(
    model: &str,
    credentials: &ProviderCredentials,
    service_account: Option<&str>,
    endpoints: &UpstreamEndpoints,
) -> AppResult<Box<dyn ImageProvider>> {
    match classify_image_model(model) {
        Provider::Imagen => {
            let (project_id, service_account) =
                match (credentials.vertex_project_id.as_deref(), service_account) {
                    (Some(project_id), Some(service_account)) => (project_id, service_account),
                    _ => {
                        return Err(AppError::MissingCredential(
                            "Vertex AI configuration required for Imagen. Please add Project ID and Service Account JSON in settings."
                                .to_string(),
                        ))
                    }
                };
            let location = credentials.vertex_location.as_str();
            if !is_valid_vertex_location(location) {
                return Err(AppError::BadRequest(format!(
                    "Invalid Vertex AI location: {}",
                    location
                )));
            }
            let account = ServiceAccount::from_json(service_account)?;
            Ok(Box::new(ImagenImages::new(
                endpoints.vertex_base(location),
                endpoints.google_token.as_str(),
                project_id,
                location,
                account,
            )))
        }
        Provider::Gemini => {
            let key = credentials.gemini.as_deref().ok_or_else(|| {
                AppError::MissingCredential(format!(
                    "Gemini API key required for model \"{}\". Please add your Gemini API key in settings.",
                    model
                ))
            })?;
            Ok(Box::new(GeminiImages::new(endpoints.gemini.as_str(), key)))
        }
        _ => {
            let key = credentials.openai.as_deref().ok_or_else(|| {
                AppError::MissingCredential("OpenAI API key is required".to_string())
            })?;
            Ok(Box::new(OpenAiImages::new(endpoints.openai.as_str(), key)))
        }
    }
}

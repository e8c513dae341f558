//! Key validation and model catalog endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::{catalog::catalog, catalog::CatalogResponse, KeyValidationResponse, Provider},
    error::{AppError, ErrorResponse},
    middleware::ProviderCredentials,
    proxy::RequestContext,
    routes::metrics::record_request,
    validation::validate_key,
    AppState,
};

const ENDPOINT: &str = "/api/models";

/// Query of the key validation endpoint
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ValidationQuery {
    /// `openai`, `gemini` or `claude`; defaults to `openai`
    pub provider: Option<String>,
}

/// Check that an API key is usable
///
/// The key travels in `x-api-key` whatever the provider. Quota, region and
/// policy failures do not make a key invalid.
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "Keys",
    params(
        ValidationQuery,
        ("x-api-key" = String, Header, description = "Key to validate"),
    ),
    responses(
        (status = 200, description = "Key accepted", body = KeyValidationResponse),
        (status = 400, description = "Unknown provider", body = ErrorResponse),
        (status = 401, description = "Missing or invalid key", body = ErrorResponse),
    )
)]
pub async fn validate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(credentials): Extension<ProviderCredentials>,
    Query(query): Query<ValidationQuery>,
) -> Result<Json<KeyValidationResponse>, AppError> {
    let key = credentials
        .openai
        .as_deref()
        .ok_or_else(|| AppError::MissingCredential("API key is required".to_string()))?;

    let name = query.provider.as_deref().unwrap_or("openai");
    let provider = match Provider::parse(name) {
        Some(p @ (Provider::OpenAi | Provider::Gemini | Provider::Claude)) => p,
        _ => return Err(AppError::BadRequest(format!("Unknown provider: {}", name))),
    };

    let ctx = RequestContext::new(provider, ENDPOINT);
    ctx.log_request_start();

    match validate_key(&state.http_client, &state.config.endpoints, provider, key, &ctx).await {
        Ok(response) => {
            record_request(ENDPOINT, provider.as_str(), "success", ctx.elapsed_secs());
            ctx.log_request_complete(None);
            Ok(Json(response))
        }
        Err(e) => {
            ctx.log_warning(&format!("Key validation failed: {}", e));
            record_request(ENDPOINT, provider.as_str(), e.kind(), ctx.elapsed_secs());
            Err(e)
        }
    }
}

/// Models the UI can offer, with their valid image sizes
#[utoipa::path(
    get,
    path = "/api/catalog",
    tag = "Keys",
    responses(
        (status = 200, description = "Model catalog", body = CatalogResponse),
    )
)]
pub async fn model_catalog() -> Json<CatalogResponse> {
    Json(catalog())
}

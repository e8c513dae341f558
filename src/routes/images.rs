//! Image generation endpoint

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::{
    api::{ImageGenerationResponse, ImageRequestBody},
    error::{AppError, AppResult, ErrorResponse},
    middleware::ProviderCredentials,
    proxy::{classify_image_model, image_adapter, RequestContext},
    routes::metrics::record_request,
    AppState,
};

const ENDPOINT: &str = "/api/images";

/// Generate images
///
/// `imagen-*` models go to Vertex AI and need `x-vertex-project-id` plus the
/// service account JSON in the body. `gemini*` models need
/// `x-gemini-api-key`. Every other model is an OpenAI image model.
#[utoipa::path(
    post,
    path = "/api/images",
    tag = "Images",
    request_body = ImageRequestBody,
    params(
        ("x-api-key" = Option<String>, Header, description = "OpenAI API key"),
        ("x-gemini-api-key" = Option<String>, Header, description = "Gemini API key"),
        ("x-vertex-project-id" = Option<String>, Header, description = "Google Cloud project for Imagen"),
        ("x-vertex-location" = Option<String>, Header, description = "Vertex AI region, defaults to us-central1"),
    ),
    responses(
        (status = 200, description = "Generated images", body = ImageGenerationResponse),
        (status = 400, description = "Missing prompt or model, or unsupported size", body = ErrorResponse),
        (status = 401, description = "Missing or rejected credential", body = ErrorResponse),
        (status = 500, description = "Upstream or internal failure", body = ErrorResponse),
    )
)]
pub async fn generate_images(
    State(state): State<Arc<AppState>>,
    Extension(credentials): Extension<ProviderCredentials>,
    body: Bytes,
) -> Result<Response, AppError> {
    let body: ImageRequestBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    let (request, service_account) = body.into_request()?;

    let provider = classify_image_model(&request.model);
    let ctx = RequestContext::new(provider, ENDPOINT).with_model(request.model.clone());
    ctx.log_request_start();

    let result: AppResult<ImageGenerationResponse> = async {
        let adapter = image_adapter(
            &request.model,
            &credentials,
            service_account.as_deref(),
            &state.config.endpoints,
        )?;
        adapter.generate(&state.http_client, &request, &ctx).await
    }
    .await;

    match result {
        Ok(response) => {
            record_request(ENDPOINT, provider.as_str(), "success", ctx.elapsed_secs());
            ctx.log_request_complete(None);
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        Err(e) => {
            ctx.log_error(&e.to_string());
            record_request(ENDPOINT, provider.as_str(), e.kind(), ctx.elapsed_secs());
            Err(e)
        }
    }
}

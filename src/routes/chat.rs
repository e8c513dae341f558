//! Chat endpoint
//!
//! Routes a normalized chat request to the provider serving its model and
//! answers with either the full assistant message or the normalized SSE
//! stream.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use futures::StreamExt;

use crate::{
    api::{ChatRequest, ChatRequestBody, ChatResponse},
    error::{AppError, AppResult, ErrorResponse},
    middleware::ProviderCredentials,
    proxy::{chat_adapter, classify_chat_model, complete_chat, stream_chat, RequestContext},
    routes::metrics::{record_request, record_stream_chunks, record_tokens},
    streaming::format_sse_done,
    AppState,
};

const ENDPOINT: &str = "/api/chat";

/// Chat with any supported model
///
/// The model selects the provider: `gemini*` models need `x-gemini-api-key`,
/// every other model needs an OpenAI key in `x-api-key`. With `stream: true`
/// the answer is `text/event-stream` of
/// `data: {"choices":[{"delta":{"content":"..."}}]}` events ending with
/// `data: [DONE]`.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "Chat",
    request_body = ChatRequestBody,
    params(
        ("x-api-key" = Option<String>, Header, description = "OpenAI API key"),
        ("x-gemini-api-key" = Option<String>, Header, description = "Gemini API key"),
    ),
    responses(
        (status = 200, description = "Assistant message, or an SSE stream when streaming", body = ChatResponse),
        (status = 400, description = "Missing messages or model", body = ErrorResponse),
        (status = 401, description = "Missing or rejected credential", body = ErrorResponse),
        (status = 500, description = "Upstream or internal failure", body = ErrorResponse),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(credentials): Extension<ProviderCredentials>,
    body: Bytes,
) -> Result<Response, AppError> {
    let body: ChatRequestBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    let request = body.into_request()?;

    let provider = classify_chat_model(&request.model);
    let ctx = RequestContext::new(provider, ENDPOINT)
        .with_model(request.model.clone())
        .with_streaming(request.stream);
    ctx.log_request_start();

    let result = if request.stream {
        handle_streaming_chat(&state, &credentials, &request, &ctx).await
    } else {
        handle_non_streaming_chat(&state, &credentials, &request, &ctx).await
    };

    if let Err(e) = &result {
        ctx.log_error(&e.to_string());
        record_request(ENDPOINT, provider.as_str(), e.kind(), ctx.elapsed_secs());
    }
    result
}

async fn handle_non_streaming_chat(
    state: &AppState,
    credentials: &ProviderCredentials,
    request: &ChatRequest,
    ctx: &RequestContext,
) -> AppResult<Response> {
    let adapter = chat_adapter(&request.model, credentials, &state.config.endpoints)?;
    let response = complete_chat(adapter.as_ref(), &state.http_client, request, ctx).await?;

    record_request(ENDPOINT, ctx.provider.as_str(), "success", ctx.elapsed_secs());
    if let Some(usage) = &response.usage {
        record_tokens("prompt", usage.prompt_tokens as u64, &request.model);
        record_tokens("completion", usage.completion_tokens as u64, &request.model);
    }
    ctx.log_request_complete(response.usage.as_ref().map(|u| u.total_tokens));

    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn handle_streaming_chat(
    state: &AppState,
    credentials: &ProviderCredentials,
    request: &ChatRequest,
    ctx: &RequestContext,
) -> AppResult<Response> {
    let adapter = chat_adapter(&request.model, credentials, &state.config.endpoints)?;
    let stream = stream_chat(adapter.as_ref(), &state.http_client, request, ctx).await?;

    record_request(ENDPOINT, ctx.provider.as_str(), "streaming", ctx.elapsed_secs());
    ctx.log_stream_started();

    let ctx = ctx.clone();
    let tracked_stream = async_stream::stream! {
        let mut stream = stream;
        let mut chunks = 0usize;
        while let Some(item) = stream.next().await {
            match &item {
                Ok(bytes) if *bytes != format_sse_done() => chunks += 1,
                Ok(_) => {}
                Err(e) => ctx.log_error(&e.to_string()),
            }
            yield item;
        }
        record_stream_chunks(ctx.provider.as_str(), chunks as u64);
        ctx.log_stream_ended(chunks);
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(tracked_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}

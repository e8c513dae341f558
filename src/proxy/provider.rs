//! Provider abstraction layer
//!
//! Chat adapters implement [`ChatProvider`]: they build the upstream request
//! and parse the upstream answer, while sending, status handling and stream
//! translation are shared here. Image adapters implement [`ImageProvider`].
//!
//! The dispatcher picks one adapter per request; nothing downstream looks at
//! the model name again.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::pin::Pin;

use crate::{
    api::{ChatRequest, ChatResponse, ImageGenerationResponse, ImageRequest, Provider},
    error::{AppError, AppResult},
    proxy::logging::RequestContext,
    streaming::{translate_stream, StreamDialect, TranslatedStream},
};

/// Raw upstream body stream
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// A chat-capable provider bound to one caller credential.
pub trait ChatProvider: Send + Sync {
    /// Provider identity for logs, metrics and error messages
    fn provider(&self) -> Provider;

    /// Build the upstream call for a request.
    ///
    /// Streaming and non-streaming calls differ in endpoint or body, so the
    /// adapter reads `request.stream` itself.
    fn build_request(&self, client: &Client, request: &ChatRequest) -> AppResult<RequestBuilder>;

    /// Turn a successful non-streaming upstream body into the normalized response
    fn parse_response(&self, body: Value, request: &ChatRequest) -> AppResult<ChatResponse>;

    /// How this provider frames its stream events
    fn stream_dialect(&self) -> StreamDialect;

    /// Map a non-success upstream answer to an error
    fn upstream_error(&self, status: u16, body: &str, _request: &ChatRequest) -> AppError {
        upstream_error(self.provider(), status, body)
    }
}

/// An image-generation provider bound to one caller credential
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(
        &self,
        client: &Client,
        request: &ImageRequest,
        ctx: &RequestContext,
    ) -> AppResult<ImageGenerationResponse>;
}

/// Run a non-streaming chat call
pub async fn complete_chat(
    adapter: &dyn ChatProvider,
    client: &Client,
    request: &ChatRequest,
    ctx: &RequestContext,
) -> AppResult<ChatResponse> {
    let builder = adapter.build_request(client, request)?;
    let response = send(client, builder, ctx).await?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let text = response.text().await.unwrap_or_default();
        return Err(adapter.upstream_error(status, &text, request));
    }

    let body = read_json(response, adapter.provider()).await?;
    adapter.parse_response(body, request)
}

/// Open a streaming chat call and wrap its body in the stream translator
pub async fn stream_chat(
    adapter: &dyn ChatProvider,
    client: &Client,
    request: &ChatRequest,
    ctx: &RequestContext,
) -> AppResult<TranslatedStream> {
    let builder = adapter.build_request(client, request)?;
    let response = send(client, builder, ctx).await?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let text = response.text().await.unwrap_or_default();
        return Err(adapter.upstream_error(status, &text, request));
    }

    let upstream: ByteStream = Box::pin(response.bytes_stream());
    Ok(translate_stream(upstream, adapter.stream_dialect()))
}

/// Send a request, logging the call and its status.
///
/// Returns the response whatever its status; callers decide how to read
/// failures.
pub async fn send(client: &Client, builder: RequestBuilder, ctx: &RequestContext) -> AppResult<Response> {
    let request = builder.build()?;
    let url = request.url().to_string();
    ctx.log_upstream_request(&url);

    let response = client.execute(request).await.map_err(|e| {
        ctx.log_connection_error(&e.to_string(), &url);
        e
    })?;

    ctx.log_upstream_response(response.status().as_u16());
    Ok(response)
}

/// Send a request and fail on any non-success status with the standard
/// upstream error extraction
pub async fn send_checked(
    client: &Client,
    builder: RequestBuilder,
    ctx: &RequestContext,
) -> AppResult<Response> {
    let response = send(client, builder, ctx).await?;
    let status = response.status().as_u16();
    if (200..300).contains(&status) {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(upstream_error(ctx.provider, status, &text))
}

/// Read a successful body as JSON
pub async fn read_json(response: Response, provider: Provider) -> AppResult<Value> {
    let text = response.text().await?;
    parse_json_body(&text, provider)
}

/// Parse an upstream body, reporting empty or non-JSON bodies as protocol errors
pub fn parse_json_body(text: &str, provider: Provider) -> AppResult<Value> {
    if text.trim().is_empty() {
        return Err(AppError::UpstreamProtocol(format!(
            "Empty response from {} API",
            provider.display_name()
        )));
    }

    serde_json::from_str(text).map_err(|_| {
        let preview: String = text.chars().take(200).collect();
        AppError::UpstreamProtocol(format!("Invalid JSON response: {}", preview))
    })
}

/// Human-readable message of a failed upstream call.
///
/// `error.message` when the body is JSON carrying one, the raw body when it
/// is not JSON, and `"<Provider> API error: <status>"` otherwise.
pub fn upstream_error_message(provider: Provider, status: u16, body: &str) -> String {
    let fallback = || format!("{} API error: {}", provider.display_name(), status);

    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(fallback),
        Err(_) if !body.trim().is_empty() => body.to_string(),
        Err(_) => fallback(),
    }
}

/// Error for a failed upstream call, classified by status
pub fn upstream_error(provider: Provider, status: u16, body: &str) -> AppError {
    AppError::from_upstream_status(status, upstream_error_message(provider, status, body))
}

//! Request logging for upstream provider calls
//!
//! Every adapter call carries a [`RequestContext`] so that the start, the
//! upstream answer and the outcome of one request share a short trace id.
//! Credentials never appear in these logs.

use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::Provider;

/// Context for tracking one upstream call
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Short identifier for log correlation
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Provider handling this request
    pub provider: Provider,
    /// Public endpoint that triggered the call
    pub endpoint: &'static str,
    /// Model being used (if applicable)
    pub model: Option<String>,
    /// Whether this is a streaming request
    pub streaming: bool,
}

impl RequestContext {
    pub fn new(provider: Provider, endpoint: &'static str) -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            start_time: Instant::now(),
            provider,
            endpoint,
            model: None,
            streaming: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Elapsed time in seconds, for duration histograms
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            model = ?self.model,
            streaming = %self.streaming,
            "Request started"
        );
    }

    /// Log the outgoing call. The URL is logged without its query string,
    /// which holds the Gemini key.
    pub fn log_upstream_request(&self, url: &str) {
        let url = url.split('?').next().unwrap_or(url);
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            url = %url,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    pub fn log_upstream_response(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    pub fn log_request_complete(&self, tokens: Option<u32>) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            model = ?self.model,
            tokens = ?tokens,
            elapsed_ms = %self.elapsed_ms(),
            "Request completed successfully"
        );
    }

    pub fn log_stream_started(&self) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response started"
        );
    }

    pub fn log_stream_ended(&self, chunks: usize) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            chunks = %chunks,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            elapsed_ms = %self.elapsed_ms(),
            message = %message,
            "Warning during request"
        );
    }

    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            endpoint = %self.endpoint,
            model = ?self.model,
            streaming = %self.streaming,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Log connection error (network failure before any status)
    pub fn log_connection_error(&self, error: &str, url: &str) {
        let url = url.split('?').next().unwrap_or(url);
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            url = %url,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Connection to upstream failed"
        );
    }
}

//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;
    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "switchboard_requests_total",
        "Total number of API requests by endpoint, provider and outcome"
    );
    metrics::describe_histogram!(
        "switchboard_request_duration_seconds",
        "Time until the response (or the first stream byte) in seconds"
    );
    metrics::describe_counter!(
        "switchboard_tokens_total",
        "Tokens reported by providers"
    );
    metrics::describe_counter!(
        "switchboard_stream_chunks_total",
        "Normalized stream events forwarded to clients"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a finished request
pub fn record_request(endpoint: &str, provider: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "switchboard_requests_total",
        "endpoint" => endpoint.to_string(),
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "switchboard_request_duration_seconds",
        "endpoint" => endpoint.to_string(),
        "provider" => provider.to_string()
    )
    .record(duration_secs);
}

/// Record tokens reported in a usage block
pub fn record_tokens(token_type: &str, count: u64, model: &str) {
    metrics::counter!(
        "switchboard_tokens_total",
        "type" => token_type.to_string(),
        "model" => model.to_string()
    )
    .increment(count);
}

/// Record streamed events
pub fn record_stream_chunks(provider: &str, count: u64) {
    metrics::counter!("switchboard_stream_chunks_total", "provider" => provider.to_string())
        .increment(count);
}

//! HTTP routes for Switchboard
//!
//! This module defines all HTTP endpoints exposed by the gateway.

pub mod chat;
pub mod docs;
pub mod health;
pub mod images;
pub mod metrics;
pub mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{middleware::credentials_middleware, AppState};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Caller-supplied provider credentials are read once per request
    let api_routes = Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/images", post(images::generate_images))
        .route("/api/models", get(models::validate_api_key))
        .route("/api/catalog", get(models::model_catalog))
        .layer(middleware::from_fn(credentials_middleware));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(docs::create_docs_router(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

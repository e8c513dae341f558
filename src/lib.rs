//! Switchboard - Multi-provider AI chat and image gateway
//!
//! This library provides the core functionality for the Switchboard server.
//! It routes normalized chat and image requests to OpenAI, Gemini and
//! Vertex AI Imagen with caller-supplied credentials, and translates every
//! provider's stream into one SSE format.

pub mod api;
pub mod config;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod streaming;
pub mod validation;

use std::time::Instant;

use anyhow::Result;

pub use crate::config::{Config, UpstreamEndpoints};
pub use crate::error::{AppError, AppResult};
pub use crate::proxy::{ChatProvider, ImageProvider};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // No timeout: streams stay open as long as the provider generates
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .build()?;

        Ok(Self {
            config,
            http_client,
            start_time: Instant::now(),
        })
    }
}

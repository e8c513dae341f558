//! Configuration management for Switchboard
//!
//! Configuration is loaded from environment variables. Provider credentials are
//! never part of configuration: callers supply them on every request.

use anyhow::{Context, Result};
use std::env;

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
/// Default Gemini (Generative Language) API base URL
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Anthropic API base URL
pub const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
/// Google OAuth2 token endpoint used for the JWT-bearer grant
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Base URLs of every upstream the adapters talk to.
///
/// Grouped so that tests can point all adapters at mock servers at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    /// OpenAI-compatible API base URL
    pub openai: String,
    /// Gemini API base URL
    pub gemini: String,
    /// Anthropic API base URL
    pub anthropic: String,
    /// OAuth2 token endpoint for service-account assertions
    pub google_token: String,
    /// Fixed Vertex AI base URL. When `None` the regional endpoint
    /// `https://{location}-aiplatform.googleapis.com/v1` is used.
    pub vertex: Option<String>,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            openai: DEFAULT_OPENAI_API_URL.to_string(),
            gemini: DEFAULT_GEMINI_API_URL.to_string(),
            anthropic: DEFAULT_ANTHROPIC_API_URL.to_string(),
            google_token: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
            vertex: None,
        }
    }
}

impl UpstreamEndpoints {
    /// Vertex AI base URL for a region
    pub fn vertex_base(&self, location: &str) -> String {
        match &self.vertex {
            Some(url) => url.clone(),
            None => format!("https://{}-aiplatform.googleapis.com/v1", location),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Upstream provider URLs
    pub endpoints: UpstreamEndpoints,

    /// Key protecting the API docs. Docs are open when unset.
    pub docs_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SWITCHBOARD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SWITCHBOARD_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SWITCHBOARD_PORT")?,

            endpoints: UpstreamEndpoints {
                openai: env::var("OPENAI_API_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string()),
                gemini: env::var("GEMINI_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
                anthropic: env::var("ANTHROPIC_API_URL")
                    .unwrap_or_else(|_| DEFAULT_ANTHROPIC_API_URL.to_string()),
                google_token: env::var("GOOGLE_TOKEN_URL")
                    .unwrap_or_else(|_| DEFAULT_GOOGLE_TOKEN_URL.to_string()),
                vertex: env::var("VERTEX_API_URL").ok().filter(|v| !v.is_empty()),
            },

            docs_api_key: env::var("DOCS_API_KEY").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Configuration pointing every upstream at the given endpoints
    pub fn with_endpoints(endpoints: UpstreamEndpoints) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            endpoints,
            docs_api_key: None,
        }
    }
}

//! Credentials middleware
//!
//! Reads the per-request provider credentials from their headers once and
//! hands them to handlers through request extensions. Nothing is stored.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use tracing::debug;

/// OpenAI key (also the generic key of the validation endpoint)
pub const OPENAI_KEY_HEADER: &str = "x-api-key";
pub const GEMINI_KEY_HEADER: &str = "x-gemini-api-key";
pub const VERTEX_PROJECT_HEADER: &str = "x-vertex-project-id";
pub const VERTEX_LOCATION_HEADER: &str = "x-vertex-location";

/// Region used when the caller does not pick one
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";

/// Credentials supplied by the caller for this request.
///
/// The Vertex service account is not here: it travels in the image request
/// body.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub openai: Option<String>,
    pub gemini: Option<String>,
    pub vertex_project_id: Option<String>,
    pub vertex_location: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("openai", &self.openai.is_some())
            .field("gemini", &self.gemini.is_some())
            .field("vertex_project_id", &self.vertex_project_id)
            .field("vertex_location", &self.vertex_location)
            .finish()
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ProviderCredentials {
    /// Read credentials from request headers; blank values count as absent
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            openai: header_value(headers, OPENAI_KEY_HEADER),
            gemini: header_value(headers, GEMINI_KEY_HEADER),
            vertex_project_id: header_value(headers, VERTEX_PROJECT_HEADER),
            vertex_location: header_value(headers, VERTEX_LOCATION_HEADER)
                .unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.to_string()),
        }
    }
}

/// Attach [`ProviderCredentials`] to the request
pub async fn credentials_middleware(mut request: Request, next: Next) -> Response {
    let credentials = ProviderCredentials::from_headers(request.headers());
    debug!(
        path = %request.uri().path(),
        has_openai_key = credentials.openai.is_some(),
        has_gemini_key = credentials.gemini.is_some(),
        has_vertex_project = credentials.vertex_project_id.is_some(),
        "Credentials extracted"
    );

    request.extensions_mut().insert(credentials);
    next.run(request).await
}

//! API documentation endpoints
//!
//! Serves Swagger UI and the raw OpenAPI document. When `DOCS_API_KEY` is
//! configured the endpoints answer 404 unless `X-Docs-Key` matches, so their
//! existence stays hidden.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use crate::{docs::ApiDoc, AppState};

pub const DOCS_KEY_HEADER: &str = "X-Docs-Key";

/// Hide the docs unless the configured key is presented
pub async fn docs_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(expected) = state.config.docs_api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(DOCS_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(provided) if provided == expected => Ok(next.run(request).await),
        _ => Err(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

/// Docs router
///
/// - GET /docs - Swagger UI
/// - GET /docs/openapi.json - OpenAPI document
///
/// Swagger UI assets load from the unpkg CDN.
pub fn create_docs_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/docs", get(swagger_ui))
        .route("/docs/", get(swagger_ui))
        .route("/docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn_with_state(state, docs_auth_middleware))
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Switchboard API - Documentation</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>"#;

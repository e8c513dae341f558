//! Error types for Switchboard
//!
//! Every failure ends up as a human-readable message plus an HTTP status,
//! rendered to the client as `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Required request fields are missing or malformed
    #[error("{0}")]
    BadRequest(String),

    /// The credential required by the selected provider was not supplied
    #[error("{0}")]
    MissingCredential(String),

    /// A credential probe concluded the key is unusable
    #[error("{0}")]
    InvalidCredential(String),

    /// The provider rejected the credential (401/403)
    #[error("{message}")]
    UpstreamAuth { status: StatusCode, message: String },

    /// The provider reported a rate limit or exhausted quota
    #[error("{message}")]
    QuotaExceeded { status: StatusCode, message: String },

    /// Generation was refused by a provider safety filter
    #[error("{0}")]
    ContentBlocked(String),

    /// Any other non-success upstream status
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// The upstream answered with a body we could not make sense of
    #[error("{0}")]
    UpstreamProtocol(String),

    /// Network failure talking to the upstream
    #[error("{0}")]
    UpstreamTransport(#[from] reqwest::Error),

    /// Vertex AI service-account assertion or token exchange failed
    #[error("Failed to get access token: {0}")]
    TokenExchange(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build the error for a non-success upstream status.
    ///
    /// 401/403 map to [`AppError::UpstreamAuth`], 429 to
    /// [`AppError::QuotaExceeded`], everything else to [`AppError::Upstream`].
    /// The upstream status is carried so the client sees the same code.
    pub fn from_upstream_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::UpstreamAuth { status, message }
            }
            StatusCode::TOO_MANY_REQUESTS => AppError::QuotaExceeded { status, message },
            _ => AppError::Upstream { status, message },
        }
    }

    /// HTTP status returned to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredential(_) | AppError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::UpstreamAuth { status, .. }
            | AppError::QuotaExceeded { status, .. }
            | AppError::Upstream { status, .. } => *status,
            AppError::UpstreamTransport(e) => e
                .status()
                .and_then(|s| StatusCode::from_u16(s.as_u16()).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::ContentBlocked(_)
            | AppError::UpstreamProtocol(_)
            | AppError::TokenExchange(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::MissingCredential(_) => "missing_credential",
            AppError::InvalidCredential(_) => "invalid_credential",
            AppError::UpstreamAuth { .. } => "upstream_auth",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::ContentBlocked(_) => "content_blocked",
            AppError::Upstream { .. } => "upstream_error",
            AppError::UpstreamProtocol(_) => "upstream_protocol",
            AppError::UpstreamTransport(_) => "upstream_transport",
            AppError::TokenExchange(_) => "token_exchange",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    #[schema(example = "OpenAI API key is required")]
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Internal(e) => {
                let text = e.to_string();
                if text.is_empty() {
                    "Internal server error".to_string()
                } else {
                    text
                }
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

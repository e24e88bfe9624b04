//! Error types for the two forwarding paths and for startup.
//!
//! Each forwarding path renders its own envelope; see `http::response`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::{self, ApiErrorBody, DownloadErrorBody};
use crate::security::SsrfRejection;

const API_ERROR: &str = "proxy request failed";

/// Failures on the buffered API path. Rendered as `{error, message}`.
#[derive(Debug, Error)]
pub enum ApiProxyError {
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

impl ApiProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiProxyError::ResponseTooLarge { .. } => StatusCode::BAD_GATEWAY,
            ApiProxyError::RequestBody(_) | ApiProxyError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiProxyError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: API_ERROR.to_string(),
            message: self.to_string(),
        };
        response::error(self.status_code(), &body)
    }
}

/// Failures on the streaming download path. Rendered as `{success:false, error}`.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("missing url parameter")]
    MissingUrl,

    #[error("url invalid or points to a private address")]
    InvalidUrl(#[source] SsrfRejection),

    #[error("HTTP {} {}", .0.as_u16(), .0.canonical_reason().unwrap_or(""))]
    UpstreamStatus(StatusCode),

    #[error("upstream did not respond within {secs}s")]
    Timeout { secs: u64 },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

impl DownloadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DownloadError::MissingUrl | DownloadError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            DownloadError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
            DownloadError::RequestBody(_)
            | DownloadError::MalformedBody(_)
            | DownloadError::Timeout { .. }
            | DownloadError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        let body = DownloadErrorBody::new(self.to_string().trim_end());
        response::error(self.status_code(), &body)
    }
}

/// Failures while building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

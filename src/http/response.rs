//! Response envelopes.
//!
//! # Responsibilities
//! - Build JSON success/error responses with uniform CORS headers
//! - Answer CORS preflight requests
//! - Render the plain-text invalid path message
//!
//! # Design Decisions
//! - The API and download paths keep distinct error shapes; existing callers
//!   parse them differently
//! - Every response leaving the proxy carries `Access-Control-Allow-Origin: *`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const ENCODING_BASE64: &str = "base64";

/// Successful API payload: the upstream body, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyEnvelope {
    pub data: String,
    pub encoding: String,
}

impl ProxyEnvelope {
    pub fn base64(data: String) -> Self {
        Self {
            data,
            encoding: ENCODING_BASE64.to_string(),
        }
    }
}

/// Error shape of the API path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
}

/// Error shape of the download path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadErrorBody {
    pub success: bool,
    pub error: String,
}

impl DownloadErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// JSON response carrying `payload`.
pub fn success<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    with_cors((status, Json(payload)).into_response())
}

/// JSON error response; `body` is one of the per-path error shapes.
pub fn error<T: Serialize>(status: StatusCode, body: &T) -> Response {
    with_cors((status, Json(body)).into_response())
}

/// 200 with an empty body and the permissive CORS policy.
pub fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// 400 plain text listing the routes callers may use.
pub fn invalid_path<'a>(prefixes: impl IntoIterator<Item = &'a str>) -> Response {
    let routes = prefixes
        .into_iter()
        .map(|p| format!("/{p}/*"))
        .collect::<Vec<_>>()
        .join(" or ");
    let message = format!(
        "Invalid path. Use {routes} for API proxy, or POST /download for file download"
    );
    with_cors((StatusCode::BAD_REQUEST, message).into_response())
}

/// Attach the open allow-origin header.
pub fn with_cors(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

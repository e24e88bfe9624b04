//! Streaming download of caller-specified URLs.
//!
//! # Responsibilities
//! - Parse `{url, headers?}` from the request body
//! - Refuse private/reserved targets before any connection is made
//! - Stream the upstream body back unbuffered, keeping range semantics
//!
//! # Design Decisions
//! - Payloads may be large media files; the body is never held in memory
//! - Only a fixed set of upstream headers is passed back
//! - Upstream failures (502) are kept apart from proxy failures (500)

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderName},
    response::Response,
};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::{LimitsConfig, TimeoutConfig};
use crate::error::DownloadError;
use crate::http::response;
use crate::security::{custom_headers, ssrf, SsrfRejection};

/// Upstream headers forwarded to the caller.
pub const STREAMED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

/// A parsed `POST /download` body.
#[derive(Debug, Clone)]
pub struct DownloadSpec {
    pub url: String,
    pub headers: HeaderMap,
}

impl DownloadSpec {
    /// Parse the JSON body. `headers` is optional and filtered, see
    /// [`custom_headers`].
    pub fn parse(body: &[u8]) -> Result<Self, DownloadError> {
        let value: Value = serde_json::from_slice(body)?;

        let url = match value.get("url") {
            None | Some(Value::Null) => return Err(DownloadError::MissingUrl),
            Some(Value::String(url)) if url.is_empty() => return Err(DownloadError::MissingUrl),
            Some(Value::String(url)) => url.clone(),
            Some(other) => {
                return Err(DownloadError::InvalidUrl(SsrfRejection::Unparseable(
                    other.to_string(),
                )))
            }
        };

        Ok(Self {
            url,
            headers: custom_headers(value.get("headers")),
        })
    }
}

/// Handle `POST /download`.
///
/// Response headers must arrive within `timeouts.request_secs`; the body
/// stream afterwards is bounded only by the client's read timeout.
pub async fn forward(
    client: &Client,
    body: Body,
    limits: &LimitsConfig,
    timeouts: &TimeoutConfig,
) -> Result<Response, DownloadError> {
    let body = to_bytes(body, limits.max_download_spec_bytes)
        .await
        .map_err(DownloadError::RequestBody)?;
    let spec = DownloadSpec::parse(&body)?;

    let target = ssrf::validate(&spec.url).map_err(|rejection| {
        tracing::warn!(target_url = %spec.url, reason = %rejection, "Download target rejected");
        DownloadError::InvalidUrl(rejection)
    })?;

    tracing::info!(
        target_url = %target,
        custom_headers = spec.headers.len(),
        "Forwarding download"
    );

    let secs = timeouts.request_secs;
    let upstream = tokio::time::timeout(
        Duration::from_secs(secs),
        client.get(target).headers(spec.headers).send(),
    )
    .await
    .map_err(|_| DownloadError::Timeout { secs })??;
    let status = upstream.status();

    if !status.is_success() {
        tracing::warn!(status = %status, "Download upstream failed");
        return Err(DownloadError::UpstreamStatus(status));
    }

    let mut headers = HeaderMap::new();
    for name in STREAMED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }

    tracing::debug!(
        status = %status,
        content_length = ?upstream.content_length(),
        "Streaming download"
    );

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response::with_cors(response))
}

//! Buffered forwarding to allow-listed upstreams.
//!
//! The whole upstream body is read and returned base64-encoded inside a JSON
//! envelope, so intermediaries that re-compress or transcode text cannot
//! alter the bytes the caller decodes.

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;

use crate::config::LimitsConfig;
use crate::error::ApiProxyError;
use crate::http::response::{self, ProxyEnvelope};
use crate::routing::Resolved;
use crate::security::{sanitize_outbound, without_transport};

/// Forward `request` to the resolved upstream and wrap the reply.
pub async fn forward(
    client: &Client,
    resolved: &Resolved<'_>,
    request: Request<Body>,
    limits: &LimitsConfig,
) -> Result<Response, ApiProxyError> {
    let (parts, body) = request.into_parts();
    let target = resolved.upstream_url(parts.uri.query());

    // 1. Caller headers minus infra identity and framing. Host is derived
    //    from the target URL on every hop, redirects included.
    let headers = without_transport(&sanitize_outbound(&parts.headers));

    // 2. Request body
    let body = to_bytes(body, limits.max_request_body_bytes)
        .await
        .map_err(ApiProxyError::RequestBody)?;

    tracing::debug!(
        method = %parts.method,
        target = %target,
        body_bytes = body.len(),
        "Forwarding to upstream"
    );

    let mut outbound = client.request(parts.method, target.as_str()).headers(headers);
    if !body.is_empty() {
        outbound = outbound.body(body);
    }
    let mut upstream = outbound.send().await?;
    let status = upstream.status();

    // 3. Buffer the reply, bounded
    let payload = read_capped(&mut upstream, limits.max_buffered_response_bytes).await?;

    tracing::debug!(
        status = %status,
        payload_bytes = payload.len(),
        "Upstream body buffered"
    );

    // 4. Encode raw bytes, no charset interpretation
    let envelope = ProxyEnvelope::base64(STANDARD.encode(&payload));
    Ok(response::success(status, &envelope))
}

async fn read_capped(
    upstream: &mut reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiProxyError> {
    if upstream.content_length().is_some_and(|len| len > limit as u64) {
        return Err(ApiProxyError::ResponseTooLarge { limit });
    }

    let mut payload = Vec::new();
    while let Some(chunk) = upstream.chunk().await? {
        if payload.len() + chunk.len() > limit {
            return Err(ApiProxyError::ResponseTooLarge { limit });
        }
        payload.extend_from_slice(&chunk);
    }
    Ok(payload)
}

//! Outbound header sanitization.
//!
//! # Responsibilities
//! - Strip edge-infrastructure identity headers before forwarding
//! - Strip hop-by-hop and framing headers the upstream client owns
//! - Build the download path's headers from caller-supplied JSON, bounded
//!
//! # Design Decisions
//! - Every function returns a new `HeaderMap`; inputs are never mutated
//! - API path trusts the caller's headers minus infra identity; the download
//!   path only forwards an explicit mapping, capped in count and size
//! - Over-limit or malformed custom entries are dropped silently

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

/// Headers injected by the edge platform that identify the original client.
pub const INFRA_IDENTITY_HEADERS: &[&str] =
    &["cf-connecting-ip", "cf-ipcountry", "cf-ray", "cf-visitor"];

/// Connection-scoped and framing headers re-derived by the upstream client.
pub const TRANSPORT_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "accept-encoding",
];

pub const MAX_CUSTOM_HEADERS: usize = 40;
pub const MAX_CUSTOM_HEADER_NAME_LEN: usize = 128;
pub const MAX_CUSTOM_HEADER_VALUE_LEN: usize = 2048;

/// Copy `headers` without the infra-identity family.
pub fn sanitize_outbound(headers: &HeaderMap) -> HeaderMap {
    without(headers, INFRA_IDENTITY_HEADERS)
}

/// Copy `headers` without hop-by-hop and framing headers.
pub fn without_transport(headers: &HeaderMap) -> HeaderMap {
    without(headers, TRANSPORT_HEADERS)
}

fn without(headers: &HeaderMap, denied: &[&str]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    // HeaderName is stored lowercase, so an exact comparison is case-insensitive.
    for (name, value) in headers {
        if !denied.contains(&name.as_str()) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Build outbound headers from a caller-supplied JSON object.
///
/// Entries are taken in caller order. Non-string values, oversized names or
/// values, and anything that is not a valid HTTP header are skipped; once
/// [`MAX_CUSTOM_HEADERS`] entries are accepted the rest are ignored. The
/// infra-identity denylist is applied last.
pub fn custom_headers(mapping: Option<&Value>) -> HeaderMap {
    let mut out = HeaderMap::new();
    let Some(Value::Object(entries)) = mapping else {
        return out;
    };

    let mut accepted = 0;
    for (key, value) in entries {
        if accepted == MAX_CUSTOM_HEADERS {
            break;
        }

        let Value::String(value) = value else {
            continue;
        };
        if key.len() > MAX_CUSTOM_HEADER_NAME_LEN || value.len() > MAX_CUSTOM_HEADER_VALUE_LEN {
            continue;
        }

        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            tracing::debug!(header = %key, "Dropping malformed custom header");
            continue;
        };

        // Case-variant keys collapse onto one header and count once.
        if out.insert(name, value).is_none() {
            accepted += 1;
        }
    }

    sanitize_outbound(&out)
}

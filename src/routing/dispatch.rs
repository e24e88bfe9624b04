//! Request classification by method and path.
//!
//! # Responsibilities
//! - Answer CORS preflights before anything else
//! - Send `POST /download` to the streaming forwarder
//! - Send `{GET|POST|PUT|DELETE} /<prefix>/...` to the buffering forwarder
//! - Everything else is an invalid path
//!
//! # Design Decisions
//! - The two forwarding strategies are separate variants, never one handler
//!   with a flag: their resource and error contracts differ

use axum::http::Method;

use crate::routing::resolver::{HostResolver, Resolved};

pub const DOWNLOAD_PATH: &str = "/download";

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<'r> {
    /// `OPTIONS` on any path.
    Preflight,
    /// `POST /download`: validated URL, streamed back.
    Download,
    /// Allow-listed upstream, buffered into a base64 envelope.
    Api(Resolved<'r>),
    /// Unknown prefix or unsupported method.
    Invalid,
}

impl Dispatch<'_> {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Dispatch::Preflight => "preflight",
            Dispatch::Download => "download",
            Dispatch::Api(_) => "api",
            Dispatch::Invalid => "invalid",
        }
    }
}

/// Classify a request.
pub fn classify<'r>(method: &Method, path: &str, resolver: &'r HostResolver) -> Dispatch<'r> {
    if *method == Method::OPTIONS {
        return Dispatch::Preflight;
    }

    if *method == Method::POST && path == DOWNLOAD_PATH {
        return Dispatch::Download;
    }

    let forwardable = matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::DELETE
    );
    if !forwardable {
        return Dispatch::Invalid;
    }

    match resolver.resolve(path) {
        Ok(resolved) => Dispatch::Api(resolved),
        Err(_) => Dispatch::Invalid,
    }
}

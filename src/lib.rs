//! Edge reverse proxy library.
//!
//! Forwards requests to allow-listed upstreams as base64 JSON envelopes, and
//! streams caller-specified downloads behind an SSRF guard.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

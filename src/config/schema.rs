//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route prefixes mapped to their fixed upstream hosts.
    pub routes: RoutesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body, buffering and redirect limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The route table. Wrapped so that an absent `[[routes]]` section falls
/// back to the built-in upstreams instead of an empty table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RoutesConfig(pub Vec<RouteConfig>);

impl Default for RoutesConfig {
    fn default() -> Self {
        Self(vec![
            RouteConfig::new("douyin", "www.douyin.com"),
            RouteConfig::new("ttwid", "ttwid.bytedance.com"),
        ])
    }
}

impl std::ops::Deref for RoutesConfig {
    type Target = [RouteConfig];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A single path prefix and the upstream host it forwards to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// First path segment to match, without slashes (e.g. "douyin").
    pub prefix: String,

    /// Upstream authority, optionally with a port (e.g. "www.douyin.com").
    pub upstream_host: String,

    /// Upstream scheme, "https" unless overridden.
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl RouteConfig {
    pub fn new(prefix: impl Into<String>, upstream_host: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            upstream_host: upstream_host.into(),
            scheme: default_scheme(),
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Bound on the whole buffered API exchange, and on a download until
    /// its response headers arrive, in seconds.
    pub request_secs: u64,

    /// Maximum gap between two reads of a streamed download, in seconds.
    pub download_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 30,
            download_read_secs: 60,
        }
    }
}

/// Size and redirect limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body forwarded on the API path.
    pub max_request_body_bytes: usize,

    /// Maximum upstream body buffered for the base64 envelope.
    pub max_buffered_response_bytes: usize,

    /// Maximum size of the JSON body accepted by `POST /download`.
    pub max_download_spec_bytes: usize,

    /// Maximum number of redirects followed per upstream request.
    pub max_redirects: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 2 * 1024 * 1024, // 2MB
            max_buffered_response_bytes: 32 * 1024 * 1024, // 32MB
            max_download_spec_bytes: 64 * 1024,
            max_redirects: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

//! Upstream HTTP clients.
//!
//! # Responsibilities
//! - Build one client per forwarding strategy from configuration
//! - Apply connect/request/read timeouts
//! - Own the redirect policy (download redirects re-checked against SSRF policy)
//!
//! # Design Decisions
//! - Clients are built once and shared: connection pools are the only state
//! - The API client negotiates and decodes compression; the download client
//!   passes bytes and `Content-Length` through untouched

use std::time::Duration;

use reqwest::{redirect, Client, ClientBuilder};

use crate::config::ProxyConfig;
use crate::security::ssrf;

/// The two upstream clients.
#[derive(Debug, Clone)]
pub struct Upstreams {
    pub api: Client,
    pub download: Client,
}

impl Upstreams {
    pub fn new(api: Client, download: Client) -> Self {
        Self { api, download }
    }

    /// Build both clients from configuration.
    pub fn from_config(config: &ProxyConfig) -> reqwest::Result<Self> {
        Ok(Self {
            api: api_client_builder(config).build()?,
            download: download_client_builder(config).build()?,
        })
    }
}

/// Builder for the buffered API path.
pub fn api_client_builder(config: &ProxyConfig) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
        .timeout(Duration::from_secs(config.timeouts.request_secs))
        .redirect(redirect::Policy::limited(config.limits.max_redirects))
}

/// Builder for the streaming download path.
///
/// No total timeout: a large file may legitimately take long. Each read
/// must make progress within `download_read_secs` instead.
pub fn download_client_builder(config: &ProxyConfig) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
        .read_timeout(Duration::from_secs(config.timeouts.download_read_secs))
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .redirect(guarded_redirects(config.limits.max_redirects))
}

/// Follow redirects only while every hop passes the outbound URL policy.
fn guarded_redirects(max: usize) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max {
            return attempt.error(format!("too many redirects (max {max})"));
        }

        match ssrf::check(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(rejection) => {
                tracing::warn!(
                    target_url = %attempt.url(),
                    reason = %rejection,
                    "Blocked redirect"
                );
                attempt.error(rejection)
            }
        }
    })
}

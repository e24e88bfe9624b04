//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the route table: unique, well-formed prefixes and real hosts
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route table is empty")]
    NoRoutes,

    #[error("route prefix '{0}' must be a non-empty path segment without '/'")]
    InvalidPrefix(String),

    #[error("route prefix '{0}' is defined more than once")]
    DuplicatePrefix(String),

    #[error("route '{0}' has an empty upstream host")]
    EmptyUpstreamHost(String),

    #[error("route '{prefix}' uses unsupported scheme '{scheme}'")]
    UnsupportedScheme { prefix: String, scheme: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut seen = HashSet::new();
    for route in config.routes.iter() {
        if route.prefix.is_empty() || route.prefix.contains('/') {
            errors.push(ValidationError::InvalidPrefix(route.prefix.clone()));
        } else if !seen.insert(route.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(route.prefix.clone()));
        }

        if route.upstream_host.trim().is_empty() {
            errors.push(ValidationError::EmptyUpstreamHost(route.prefix.clone()));
        }

        if route.scheme != "https" && route.scheme != "http" {
            errors.push(ValidationError::UnsupportedScheme {
                prefix: route.prefix.clone(),
                scheme: route.scheme.clone(),
            });
        }
    }

    let positive = [
        ("timeouts.connect_secs", config.timeouts.connect_secs as usize),
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
        ("timeouts.download_read_secs", config.timeouts.download_read_secs as usize),
        ("limits.max_request_body_bytes", config.limits.max_request_body_bytes),
        ("limits.max_buffered_response_bytes", config.limits.max_buffered_response_bytes),
        ("limits.max_download_spec_bytes", config.limits.max_download_spec_bytes),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

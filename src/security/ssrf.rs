//! Outbound URL policy for caller-supplied targets.
//!
//! # Responsibilities
//! - Accept only absolute http/https URLs with a host
//! - Reject loopback, link-local, private and CGNAT literals
//! - Reject reserved local hostnames (`localhost`, `*.local`, `*.internal`)
//!
//! # Design Decisions
//! - Literal filter only: no DNS lookups. A public hostname that resolves to
//!   a private address at connect time is NOT caught
//! - Fail closed: anything that looks like a dotted-decimal address but is
//!   not a valid one is rejected
//! - Reusable per redirect hop via `check`

use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use url::{Host, Url};

/// Why a URL was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SsrfRejection {
    #[error("not an absolute URL: {0}")]
    Unparseable(String),

    #[error("scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("host '{0}' is reserved for local use")]
    ReservedHostname(String),

    #[error("address {0} is in a private or reserved range")]
    PrivateAddress(String),
}

/// Parse `raw` and apply the outbound policy.
pub fn validate(raw: &str) -> Result<Url, SsrfRejection> {
    let url = Url::parse(raw).map_err(|e| SsrfRejection::Unparseable(e.to_string()))?;
    check(&url)?;
    Ok(url)
}

/// Apply the outbound policy to an already parsed URL.
pub fn check(url: &Url) -> Result<(), SsrfRejection> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(SsrfRejection::UnsupportedScheme(other.to_string())),
    }

    match url.host() {
        None => Err(SsrfRejection::MissingHost),
        Some(Host::Domain(domain)) => check_domain(domain),
        Some(Host::Ipv4(addr)) => check_ipv4(addr),
        Some(Host::Ipv6(addr)) => check_ipv6(addr),
    }
}

fn check_domain(domain: &str) -> Result<(), SsrfRejection> {
    let name = domain.trim_end_matches('.').to_ascii_lowercase();
    if name.is_empty() {
        return Err(SsrfRejection::MissingHost);
    }

    if name == "localhost"
        || name.ends_with(".localhost")
        || name.ends_with(".local")
        || name.ends_with(".internal")
    {
        return Err(SsrfRejection::ReservedHostname(domain.to_string()));
    }

    // The URL parser normally turns dotted numbers into Host::Ipv4; anything
    // numeric that survives as a domain is malformed.
    if name.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return match name.parse::<Ipv4Addr>() {
            Ok(addr) => check_ipv4(addr),
            Err(_) => Err(SsrfRejection::PrivateAddress(domain.to_string())),
        };
    }

    Ok(())
}

fn check_ipv4(addr: Ipv4Addr) -> Result<(), SsrfRejection> {
    if is_blocked_ipv4(addr) {
        Err(SsrfRejection::PrivateAddress(addr.to_string()))
    } else {
        Ok(())
    }
}

fn check_ipv6(addr: Ipv6Addr) -> Result<(), SsrfRejection> {
    if is_blocked_ipv6(addr) {
        Err(SsrfRejection::PrivateAddress(addr.to_string()))
    } else {
        Ok(())
    }
}

/// Blocked IPv4 networks as `(network, prefix length)`.
const BLOCKED_IPV4: &[(Ipv4Addr, u32)] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(100, 64, 0, 0), 10),
];

fn is_blocked_ipv4(addr: Ipv4Addr) -> bool {
    let addr = u32::from(addr);
    BLOCKED_IPV4.iter().any(|&(net, len)| {
        let mask = u32::MAX << (32 - len);
        addr & mask == u32::from(net) & mask
    })
}

fn is_blocked_ipv6(addr: Ipv6Addr) -> bool {
    if addr.is_loopback() || addr.is_unspecified() {
        return true;
    }

    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_blocked_ipv4(mapped);
    }

    let first = addr.segments()[0];
    // fe80::/10 link-local, fc00::/7 unique-local
    (first & 0xffc0) == 0xfe80 || (first & 0xfe00) == 0xfc00
}

//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch::Api(resolved)
//!     → api.rs (sanitize, forward, buffer ≤ cap, base64 envelope)
//!
//! Dispatch::Download
//!     → download.rs (parse request body, SSRF check, forward, stream body)
//!
//! Both use client.rs (one reqwest::Client per strategy)
//! ```
//!
//! # Design Decisions
//! - Two strategies, two modules: buffered envelope vs. streamed pass-through
//! - No retries: a failed upstream fetch fails the request

pub mod api;
pub mod client;
pub mod download;

pub use client::Upstreams;
pub use download::DownloadSpec;

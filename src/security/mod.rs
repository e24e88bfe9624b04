//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! API path:
//!     inbound headers → headers.rs (infra identity + transport stripped)
//!
//! Download path:
//!     caller URL      → ssrf.rs (scheme, host and literal-address policy)
//!     caller headers  → headers.rs (bounded custom mapping, infra identity stripped)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input on the download path
//! - Pure functions, no state

pub mod headers;
pub mod ssrf;

pub use headers::{custom_headers, sanitize_outbound, without_transport};
pub use ssrf::SsrfRejection;

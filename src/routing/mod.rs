//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → dispatch.rs (preflight / download / api / invalid)
//!     → resolver.rs (prefix → upstream host, remainder path)
//!     → Return: Dispatch variant
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → HostResolver (prefix map)
//!     → Freeze as immutable table shared by all requests
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (literal segment lookup only)
//! - Deterministic: same input always matches same route

pub mod dispatch;
pub mod resolver;

pub use dispatch::{classify, Dispatch};
pub use resolver::{HostResolver, NoRoute, Resolved, Route};

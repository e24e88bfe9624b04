//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → [routing decides preflight / download / api / invalid]
//!     → [proxy forwards upstream]
//!     → response.rs (envelopes, CORS)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use server::{build_router, AppState, HttpServer};

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single dispatching handler
//! - Wire up middleware (tracing with request IDs)
//! - Bind server to listener, stop on the shutdown broadcast
//! - Dispatch requests to the API or download forwarder
//! - Observability (metrics, structured logs)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{LimitsConfig, ProxyConfig, TimeoutConfig};
use crate::error::ServerError;
use crate::http::response;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::proxy::{api, download, Upstreams};
use crate::routing::{classify, Dispatch, HostResolver};

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<HostResolver>,
    pub upstreams: Upstreams,
    pub limits: Arc<LimitsConfig>,
    pub timeouts: Arc<TimeoutConfig>,
}

impl AppState {
    pub fn new(config: &ProxyConfig, upstreams: Upstreams) -> Self {
        Self {
            resolver: Arc::new(HostResolver::new(&config.routes)),
            upstreams,
            limits: Arc::new(config.limits.clone()),
            timeouts: Arc::new(config.timeouts.clone()),
        }
    }
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let upstreams = Upstreams::from_config(&config)?;
        Ok(Self::with_upstreams(config, upstreams))
    }

    /// Create a server around pre-built upstream clients.
    pub fn with_upstreams(config: ProxyConfig, upstreams: Upstreams) -> Self {
        let state = AppState::new(&config, upstreams);
        let router = build_router(state);
        Self { router, config }
    }

    /// The fully layered router, e.g. for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// Upstream timeouts live in the forwarders so a slow upstream still gets
/// the path's JSON error envelope.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/{*path}", any(proxy_handler))
        .route("/", any(proxy_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
}

/// Main proxy handler.
/// Classifies the request and hands it to the matching forwarder.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let dispatch = classify(&method, &path, &state.resolver);
    let kind = dispatch.kind();

    tracing::debug!(method = %method, path = %path, dispatch = kind, "Dispatching request");

    let response = match dispatch {
        Dispatch::Preflight => response::preflight(),

        Dispatch::Download => {
            let body = request.into_body();
            match download::forward(&state.upstreams.download, body, &state.limits, &state.timeouts)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let status = e.status_code();
                    if status.is_server_error() {
                        tracing::error!(status = %status, error = %e, "Download failed");
                    } else {
                        tracing::warn!(status = %status, error = %e, "Download rejected");
                    }
                    e.into_response()
                }
            }
        }

        Dispatch::Api(resolved) => {
            match api::forward(&state.upstreams.api, &resolved, request, &state.limits).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        upstream = %resolved.route.upstream_host,
                        status = %e.status_code(),
                        error = %e,
                        "Upstream request failed"
                    );
                    e.into_response()
                }
            }
        }

        Dispatch::Invalid => {
            tracing::warn!(method = %method, path = %path, "No route matched");
            response::invalid_path(state.resolver.prefixes())
        }
    };

    metrics::record_request(kind, response.status().as_u16(), start_time);
    response
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router funnelling every path into the dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer request bodies and expose the client address
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::KitConfig;
use crate::http::request::KitRequest;
use crate::http::response::text;
use crate::lifecycle::Shutdown;
use crate::runtime::{respond, DispatchState, SsrOptions};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub options: Arc<SsrOptions>,
    pub max_body_bytes: usize,
}

/// HTTP server in front of the dispatcher.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &KitConfig, options: SsrOptions) -> Self {
        let state = AppState {
            options: Arc::new(options),
            max_body_bytes: config.listener.max_body_bytes,
        };

        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &KitConfig, state: AppState) -> Router {
        Router::new().fallback(dispatch_handler).with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the request and hand it to the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            return text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
        }
    };

    let request = match KitRequest::from_parts(parts, body) {
        Ok(request) => request,
        Err(e) => return text(e.status(), e.to_string()),
    };

    let mut dispatch_state = DispatchState::new();
    if let Some(addr) = client {
        dispatch_state = dispatch_state.with_client_address(move || addr.ip().to_string());
    }

    match respond(request, &state.options, &dispatch_state).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e.chain(), "Dispatch failed");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

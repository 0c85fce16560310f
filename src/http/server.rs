//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Serve plain HTTP on a bound listener, or HTTPS via axum-server
//! - Dispatch requests to the routing decision
//! - Forward routed requests through the upstream transport
//! - Reject unroutable requests with 502

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::transport::UpstreamTransport;
use crate::observability::metrics;
use crate::routing::{RouteTable, Router as ProxyRouter};

/// In-flight requests get this long to finish after shutdown is signalled.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub transport: Arc<UpstreamTransport>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server routing through the given table.
    pub fn new(config: ProxyConfig, table: Arc<RouteTable>) -> Self {
        let state = AppState {
            router: Arc::new(ProxyRouter::new(Arc::clone(&table), config.upstream.port)),
            transport: Arc::new(UpstreamTransport::new(config.timeouts, table)),
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone())),
            )
    }

    /// Run the server on the given listener until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS on the given address until shutdown is signalled.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTPS server received shutdown signal");
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Looks up the route, selects a candidate, and forwards the request.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);

    let destination = match state.router.route_request(&request) {
        Ok(destination) => destination,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Rejecting request without a usable route"
            );
            metrics::record_lookup_failure(e.reason());
            metrics::record_request(StatusCode::BAD_GATEWAY.as_u16(), start_time);
            return (StatusCode::BAD_GATEWAY, "No route available for host").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        host = %destination.logical_host,
        backend = %destination.addr,
        "Proxying request"
    );

    match state.transport.forward(&destination, request, peer).await {
        Ok(response) => {
            metrics::record_request(response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                backend = %destination.addr,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(StatusCode::BAD_GATEWAY.as_u16(), start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

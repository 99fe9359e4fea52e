//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the self-health route and the dispatch fallback
//! - Wire up middleware (request ID, tracing)
//! - Select a backend per request and forward to it
//! - Stop accepting when the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::BalancerConfig;
use crate::http::proxy::ReverseProxy;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response;
use crate::load_balancer::pool::ServerPool;
use crate::observability::metrics;

/// Path answered by the balancer itself.
pub const HEALTH_PATH: &str = "/health";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ServerPool>,
    pub proxy: ReverseProxy,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that dispatches over `pool`.
    pub fn new(config: &BalancerConfig, pool: Arc<ServerPool>) -> Self {
        let state = AppState {
            pool,
            proxy: ReverseProxy::new(&config.timeouts),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route(HEALTH_PATH, any(balancer_health))
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
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
}

/// The balancer's own liveness; never consults the pool.
async fn balancer_health() -> Response {
    response::balancer_healthy()
}

/// Pick the next alive backend and forward the request to it.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let Some(backend) = state.pool.select_next() else {
        tracing::warn!(
            request_id = %request_id,
            backends = state.pool.len(),
            "No alive backends"
        );
        metrics::record_request(&method, 503, "none", start_time);
        return response::no_servers_available();
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        backend = %backend.url(),
        "Proxying request"
    );

    match state.proxy.forward(request, backend.url()).await {
        Ok(upstream) => {
            metrics::record_request(&method, upstream.status().as_u16(), backend.url().as_str(), start_time);
            upstream
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend.url(),
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method, 502, backend.url().as_str(), start_time);
            response::bad_gateway()
        }
    }
}

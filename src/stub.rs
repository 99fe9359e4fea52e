//! Backend stub used for local testing.
//!
//! Simulates a backend whose health can be flipped at runtime:
//! - `/health` answers 200 or 503 depending on the current flag
//! - `/toggle` flips the flag
//! - everything else echoes the request back as plain text

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};

/// Shared state of one stub server.
#[derive(Debug, Clone)]
pub struct StubState {
    server_id: Arc<str>,
    healthy: Arc<AtomicBool>,
}

impl StubState {
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: Arc::from(server_id.into()),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Flip the health flag and return the new value.
    pub fn toggle(&self) -> bool {
        !self.healthy.fetch_xor(true, Ordering::SeqCst)
    }
}

pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/health", any(health))
        .route("/toggle", any(toggle))
        .fallback(hello)
        .with_state(state)
}

async fn health(State(state): State<StubState>) -> impl IntoResponse {
    if state.is_healthy() {
        (StatusCode::OK, format!("Server {} is healthy\n", state.server_id()))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Server {} is unhealthy\n", state.server_id()),
        )
    }
}

async fn toggle(State(state): State<StubState>) -> impl IntoResponse {
    if state.toggle() {
        tracing::info!(server = %state.server_id(), "Server is now healthy");
    } else {
        tracing::info!(server = %state.server_id(), "Server is now unhealthy");
    }
    (StatusCode::OK, "Toggled health status\n")
}

async fn hello(State(state): State<StubState>, request: Request<Body>) -> impl IntoResponse {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!(
        server = %state.server_id(),
        peer = %peer,
        method = %request.method(),
        path = %request.uri().path(),
        "Received request"
    );

    let body = format!(
        "Hello from {}!\nRequest path: {}\nRequest method: {}\nHeaders: {:?}\n",
        state.server_id(),
        request.uri().path(),
        request.method(),
        request.headers(),
    );

    (
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (header::SERVER, state.server_id().to_string()),
        ],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
        let res = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn toggle_flips_health() {
        let state = StubState::new("Server-8081");
        let app = router(state.clone());

        assert_eq!(
            call(app.clone(), "GET", "/health").await,
            (StatusCode::OK, "Server Server-8081 is healthy\n".into())
        );

        assert_eq!(
            call(app.clone(), "POST", "/toggle").await,
            (StatusCode::OK, "Toggled health status\n".into())
        );
        assert!(!state.is_healthy());
        assert_eq!(
            call(app.clone(), "GET", "/health").await,
            (StatusCode::SERVICE_UNAVAILABLE, "Server Server-8081 is unhealthy\n".into())
        );

        call(app.clone(), "GET", "/toggle").await;
        assert!(state.is_healthy());
    }

    #[tokio::test]
    async fn echoes_other_paths() {
        let app = router(StubState::new("Server-9000"));
        let res = app
            .oneshot(Request::builder().uri("/orders/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::SERVER], "Server-9000");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain");

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.starts_with("Hello from Server-9000!\nRequest path: /orders/7\nRequest method: GET\n"));
    }
}

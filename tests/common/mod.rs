//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use health_balancer::config::{BalancerConfig, HealthCheckConfig};
use health_balancer::lifecycle::startup::build_pool;
use health_balancer::stub::{self, StubState};
use health_balancer::{HttpServer, ServerPool, Shutdown};

/// A balancer running in-process on an ephemeral port.
#[allow(dead_code)]
pub struct Balancer {
    pub addr: SocketAddr,
    pub pool: Arc<ServerPool>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl Balancer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Balancer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a backend stub on an ephemeral port.
pub async fn start_stub() -> (SocketAddr, StubState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = StubState::new(format!("Server-{}", addr.port()));
    let app = stub::router(state.clone()).into_make_service_with_connect_info::<SocketAddr>();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, state)
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// One-second probes, for tests that watch liveness change.
#[allow(dead_code)]
pub fn fast_probes() -> HealthCheckConfig {
    HealthCheckConfig {
        interval_secs: 1,
        timeout_secs: 1,
        ..HealthCheckConfig::default()
    }
}

/// Start a balancer in front of `backends`.
pub async fn start_balancer(backends: &[SocketAddr], health_check: HealthCheckConfig) -> Balancer {
    let mut config = BalancerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backends = backends.iter().map(|a| format!("http://{}", a)).collect();
    config.health_check = health_check;

    let shutdown = Shutdown::new();
    let pool = build_pool(&config, &shutdown);

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config, pool.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Balancer { addr, pool, shutdown }
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Which stub served a response, from its `Server` header.
#[allow(dead_code)]
pub fn served_by(res: &reqwest::Response) -> String {
    res.headers()
        .get("server")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

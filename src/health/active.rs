//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe one backend
//! - Update that backend's liveness from the result
//!
//! Every backend gets its own prober task and its own HTTP client, so a slow
//! backend only ever delays its own checks.

use std::sync::{Arc, Weak};
use axum::body::Body;
use axum::http::{header, uri::InvalidUri, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::state::{ProbeOutcome, Transition};
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

const PROBE_USER_AGENT: &str = "health-balancer-probe";

/// Upper bound on how much of a probe response body is drained.
const MAX_PROBE_BODY: usize = 64 * 1024;

/// Probes a single backend until shutdown.
pub struct HealthProber {
    /// Non-owning: the pool owns the backend.
    backend: Weak<Backend>,
    probe_uri: Uri,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthProber {
    pub fn new(backend: &Arc<Backend>, config: HealthCheckConfig) -> Result<Self, InvalidUri> {
        let base = backend.url().as_str().trim_end_matches('/');
        let probe_uri = format!("{}{}", base, config.path).parse::<Uri>()?;

        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Ok(Self {
            backend: Arc::downgrade(backend),
            probe_uri,
            config,
            client,
        })
    }

    pub fn probe_uri(&self) -> &Uri {
        &self.probe_uri
    }

    /// Start the probe loop on the runtime.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Probe, record, sleep; repeat until shutdown or until the backend is gone.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::debug!(
            uri = %self.probe_uri,
            interval = self.config.interval_secs,
            "Health prober starting"
        );

        loop {
            let outcome = self.probe().await;

            let Some(backend) = self.backend.upgrade() else {
                tracing::debug!(uri = %self.probe_uri, "Backend dropped, prober exiting");
                break;
            };

            match backend.record_probe(outcome, self.config.unhealthy_threshold) {
                Some(Transition::WentOffline) => {
                    tracing::warn!(
                        backend = %backend.url(),
                        failures = backend.consecutive_failures(),
                        "Backend is now offline"
                    );
                }
                Some(Transition::CameOnline) => {
                    tracing::info!(backend = %backend.url(), "Backend is back online");
                }
                None => {}
            }
            metrics::record_backend_health(backend.url().as_str(), backend.is_alive());
            drop(backend);

            tokio::select! {
                _ = time::sleep(self.config.interval()) => {}
                _ = shutdown.recv() => {
                    tracing::debug!(uri = %self.probe_uri, "Health prober received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Issue one probe. Only `200 OK` counts as success.
    pub async fn probe(&self) -> ProbeOutcome {
        let request = match Request::builder()
            .method("GET")
            .uri(self.probe_uri.clone())
            .header(header::USER_AGENT, PROBE_USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(uri = %self.probe_uri, error = %e, "Failed to build health check request");
                return ProbeOutcome::Failure;
            }
        };

        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            // Drain so the connection is released before the next cycle.
            let _ = axum::body::to_bytes(Body::new(response.into_body()), MAX_PROBE_BODY).await;
            Ok::<_, hyper_util::client::legacy::Error>(status)
        };

        match time::timeout(self.config.timeout(), exchange).await {
            Ok(Ok(StatusCode::OK)) => ProbeOutcome::Success,
            Ok(Ok(status)) => {
                tracing::warn!(uri = %self.probe_uri, status = %status, "Health check failed: non-200 status");
                ProbeOutcome::Failure
            }
            Ok(Err(e)) => {
                tracing::warn!(uri = %self.probe_uri, error = %e, "Health check failed: connection error");
                ProbeOutcome::Failure
            }
            Err(_) => {
                tracing::warn!(uri = %self.probe_uri, "Health check failed: timeout");
                ProbeOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::pool::parse_backend_url;
    use crate::stub;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn backend(address: &str) -> Arc<Backend> {
        Arc::new(Backend::new(parse_backend_url(address).unwrap()))
    }

    async fn start_stub() -> (String, stub::StubState) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = stub::StubState::new(format!("Server-{}", addr.port()));
        let app = stub::router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), state)
    }

    #[tokio::test]
    async fn probe_uri_joins_base_and_path() {
        let b = backend("http://127.0.0.1:8081");
        let prober = HealthProber::new(&b, HealthCheckConfig::default()).unwrap();
        assert_eq!(prober.probe_uri().to_string(), "http://127.0.0.1:8081/health");

        let b = backend("http://127.0.0.1:8081/api/");
        let prober = HealthProber::new(&b, HealthCheckConfig::default()).unwrap();
        assert_eq!(prober.probe_uri().to_string(), "http://127.0.0.1:8081/api/health");
    }

    #[tokio::test]
    async fn healthy_stub_probes_success() {
        let (address, _state) = start_stub().await;
        let prober = HealthProber::new(&backend(&address), HealthCheckConfig::default()).unwrap();
        assert_eq!(prober.probe().await, ProbeOutcome::Success);
    }

    #[tokio::test]
    async fn unhealthy_stub_probes_failure() {
        let (address, state) = start_stub().await;
        state.set_healthy(false);
        let prober = HealthProber::new(&backend(&address), HealthCheckConfig::default()).unwrap();
        assert_eq!(prober.probe().await, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn refused_connection_probes_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober =
            HealthProber::new(&backend(&format!("http://{}", addr)), HealthCheckConfig::default()).unwrap();
        assert_eq!(prober.probe().await, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn loop_marks_dead_then_stops_on_shutdown() {
        let (address, state) = start_stub().await;
        state.set_healthy(false);

        let b = backend(&address);
        let config = HealthCheckConfig {
            interval_secs: 1,
            unhealthy_threshold: 1,
            ..HealthCheckConfig::default()
        };
        let (tx, rx) = broadcast::channel(1);
        let handle = HealthProber::new(&b, config).unwrap().spawn(rx);

        time::sleep(Duration::from_millis(500)).await;
        assert!(!b.is_alive());

        tx.send(()).unwrap();
        time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn loop_exits_when_backend_dropped() {
        let (address, _state) = start_stub().await;
        let b = backend(&address);
        let config = HealthCheckConfig {
            interval_secs: 1,
            ..HealthCheckConfig::default()
        };
        let (_tx, rx) = broadcast::channel(1);
        let handle = HealthProber::new(&b, config).unwrap().spawn(rx);
        drop(b);

        time::timeout(Duration::from_secs(3), handle).await.unwrap().unwrap();
    }
}

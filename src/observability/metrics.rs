//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by method, status, backend
//! - `balancer_request_duration_seconds` (histogram): latency distribution
//! - `balancer_backend_alive` (gauge): 1=alive, 0=dead, per backend
//!
//! Without an installed exporter every recording call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let backend = backend.to_string();

    metrics::counter!(
        "balancer_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "backend" => backend.clone()
    )
    .increment(1);

    metrics::histogram!(
        "balancer_request_duration_seconds",
        "method" => method,
        "status" => status,
        "backend" => backend
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, alive: bool) {
    metrics::gauge!("balancer_backend_alive", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}

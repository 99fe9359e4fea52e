//! Backend pool management.
//!
//! # Responsibilities
//! - Own the registration-ordered list of backends
//! - Parse and register backend addresses, starting a prober for each
//! - Select the next alive backend in round-robin order

use std::sync::Arc;
use parking_lot::Mutex;
use url::Url;

use crate::config::HealthCheckConfig;
use crate::health::active::HealthProber;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};

/// Error type for pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("malformed backend address '{address}': {reason}")]
    MalformedAddress { address: String, reason: String },
}

impl PoolError {
    fn malformed(address: &str, reason: impl ToString) -> Self {
        PoolError::MalformedAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parse a backend base URL. Only plain `http` targets with a host are accepted.
pub fn parse_backend_url(address: &str) -> Result<Url, PoolError> {
    let url = Url::parse(address).map_err(|e| PoolError::malformed(address, e))?;
    if url.scheme() != "http" {
        return Err(PoolError::malformed(
            address,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(PoolError::malformed(address, "missing host"));
    }
    Ok(url)
}

#[derive(Debug, Default)]
struct PoolState {
    backends: Vec<Arc<Backend>>,
    rotation: RoundRobin,
}

/// The set of registered backends plus the shared rotation cursor.
#[derive(Debug)]
pub struct ServerPool {
    state: Mutex<PoolState>,
    health: HealthCheckConfig,
    shutdown: Shutdown,
}

impl ServerPool {
    /// Create an empty pool. Probers started by [`ServerPool::add_backend`]
    /// use `health` and stop when `shutdown` fires.
    pub fn new(health: HealthCheckConfig, shutdown: Shutdown) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            health,
            shutdown,
        }
    }

    /// Register a backend and start probing it.
    ///
    /// Must be called from within a Tokio runtime. On error the pool is left
    /// untouched.
    pub fn add_backend(&self, address: &str) -> Result<Arc<Backend>, PoolError> {
        let url = parse_backend_url(address)?;
        let backend = Arc::new(Backend::new(url));
        let prober = HealthProber::new(&backend, self.health.clone())
            .map_err(|e| PoolError::malformed(address, e))?;

        self.push(backend.clone());
        prober.spawn(self.shutdown.subscribe());

        tracing::info!(backend = %backend.url(), "Backend registered");
        Ok(backend)
    }

    fn push(&self, backend: Arc<Backend>) {
        self.state.lock().backends.push(backend);
    }

    /// Next alive backend in rotation order, or `None` after one full
    /// rotation without finding one.
    pub fn select_next(&self) -> Option<Arc<Backend>> {
        let mut state = self.state.lock();
        let PoolState { backends, rotation } = &mut *state;
        rotation.next_alive(backends)
    }

    /// Snapshot of all registered backends, in registration order.
    pub fn backends(&self) -> Vec<Arc<Backend>> {
        self.state.lock().backends.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.state.lock().rotation.cursor()
    }
}

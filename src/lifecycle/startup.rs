//! Startup orchestration.
//!
//! # Responsibilities
//! - Register configured backends (each starts its own prober)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - A malformed backend is logged and skipped; the rest still register
//! - Failing to bind is fatal
//! - Listener starts last (traffic only when the pool exists)

use std::sync::Arc;

use crate::config::BalancerConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::pool::ServerPool;
use crate::net::listener::{self, ListenerError};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Listen(#[from] ListenerError),
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the pool from configuration. Must run inside a Tokio runtime.
pub fn build_pool(config: &BalancerConfig, shutdown: &Shutdown) -> Arc<ServerPool> {
    let pool = Arc::new(ServerPool::new(config.health_check.clone(), shutdown.clone()));

    for address in &config.backends {
        if let Err(e) = pool.add_backend(address) {
            tracing::error!(error = %e, "Error adding backend");
        }
    }

    if pool.is_empty() {
        tracing::warn!("No backends registered; every proxied request will get 503");
    }
    pool
}

/// Register backends, bind, and serve until `shutdown` fires.
pub async fn start(config: BalancerConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let pool = build_pool(&config, &shutdown);

    let listener = listener::bind(&config.listener).await?;

    let server = HttpServer::new(&config, pool);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_backends_are_skipped() {
        let shutdown = Shutdown::new();
        let mut config = BalancerConfig::default();
        config.backends = vec![
            "http://127.0.0.1:1".into(),
            "bogus".into(),
            "http://127.0.0.1:2".into(),
        ];

        let pool = build_pool(&config, &shutdown);
        assert_eq!(pool.len(), 2);
        shutdown.trigger();
    }

    #[tokio::test]
    async fn bind_failure_is_fatal() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = BalancerConfig::default();
        config.backends.clear();
        config.listener.bind_address = taken.local_addr().unwrap().to_string();

        let err = start(config, Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Listen(ListenerError::Bind { .. })));
    }
}

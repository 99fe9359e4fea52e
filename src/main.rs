//! Health-aware round-robin load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                LOAD BALANCER                  │
//!                        │                                               │
//!     Client Request     │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!     ───────────────────┼─▶│   net   │───▶│   http   │───▶│   pool   │  │
//!                        │  │listener │    │ dispatch │    │round-robin│ │
//!                        │  └─────────┘    └────┬─────┘    └────┬─────┘  │
//!                        │                      │ /health       │        │
//!                        │                      ▼               ▼        │
//!     Client Response    │                 ┌──────────┐   ┌──────────┐   │
//!     ◀──────────────────┼─────────────────│  proxy   │◀──│ backend  │◀──┼──── Backend
//!                        │                 └──────────┘   │ liveness │   │     Server
//!                        │                                └────▲─────┘   │
//!                        │                                     │         │
//!                        │                              ┌──────┴─────┐   │
//!                        │                              │ prober per │───┼──▶ GET /health
//!                        │                              │  backend   │   │
//!                        │                              └────────────┘   │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use health_balancer::config::{read_config, validate_config, BalancerConfig, ConfigError};
use health_balancer::lifecycle::{signals, startup, Shutdown};
use health_balancer::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "health-balancer")]
#[command(about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(short, long)]
    listen: Option<String>,

    /// Backend base URL; repeat for several. Replaces the configured list.
    #[arg(short, long = "backend")]
    backends: Vec<String>,

    /// Log filter, e.g. "info" or "health_balancer=debug".
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => BalancerConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        probe_interval_secs = config.health_check.interval_secs,
        probe_timeout_secs = config.health_check.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::start(config, shutdown).await {
        tracing::error!(error = %e, "Load balancer failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

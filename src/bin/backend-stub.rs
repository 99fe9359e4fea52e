//! Backend stub: a toggleable backend for exercising the load balancer.

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;

use health_balancer::config::ObservabilityConfig;
use health_balancer::lifecycle::signals;
use health_balancer::observability::logging;
use health_balancer::stub::{self, StubState};

#[derive(Parser, Debug)]
#[command(name = "backend-stub")]
#[command(about = "Demo backend whose /health can be toggled", long_about = None)]
struct Cli {
    /// Port to serve on.
    #[arg(short, long, default_value_t = 8081)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&ObservabilityConfig::default());

    let state = StubState::new(format!("Server-{}", cli.port));
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(server = %state.server_id(), error = %e, "Error starting server");
            return Err(e.into());
        }
    };
    tracing::info!(server = %state.server_id(), address = %addr, "Backend stub starting");

    let app = stub::router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(signals::wait_for_termination())
        .await?;
    Ok(())
}

//! Health-aware round-robin load balancer library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod stub;

pub use config::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::backend::Backend;
pub use load_balancer::pool::{PoolError, ServerPool};

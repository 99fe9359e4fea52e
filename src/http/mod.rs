//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → /health answered locally
//!     → otherwise pool picks the next alive backend
//!     → proxy.rs (rewrite and forward)
//!     → response.rs (plain-text errors, header hygiene)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use proxy::{ProxyError, ReverseProxy};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};

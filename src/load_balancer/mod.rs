//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives
//!     → pool.rs (lock the backend list and rotation cursor)
//!     → round_robin.rs (advance cursor, skip dead backends, at most one rotation)
//!     → backend.rs (read liveness under its own read lock)
//!     → Return backend or None
//! ```
//!
//! # Design Decisions
//! - Backends are kept in registration order and never removed
//! - The pool lock is held only for the in-memory scan
//! - Liveness is per-backend, written only by that backend's prober

pub mod backend;
pub mod pool;
pub mod round_robin;

//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     One task per backend
//!     → GET <backend>/health with a timeout
//!     → Update state.rs through the backend record
//!     → Sleep, repeat
//!
//! State machine (state.rs):
//!     Alive ←→ Dead
//!     Three failures to go down, one success to come back
//! ```
//!
//! # Design Decisions
//! - Only the prober writes liveness; forwarding failures are not fed back
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

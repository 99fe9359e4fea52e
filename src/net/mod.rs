//! Network layer subsystem.
//!
//! Binding happens here; accepting and connection handling belong to the
//! HTTP server.

pub mod listener;

//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track liveness and the consecutive probe failure count
//!
//! Liveness sits behind a reader/writer lock: every dispatch reads it, only
//! the backend's own prober writes it.

use parking_lot::RwLock;
use url::Url;

use crate::health::state::{Liveness, ProbeOutcome, Transition};

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Base URL requests are forwarded to.
    url: Url,
    /// Liveness flag and failure counter.
    liveness: RwLock<Liveness>,
}

impl Backend {
    /// Create a new backend, marked alive.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            liveness: RwLock::new(Liveness::new()),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Return true if the backend is currently believed to serve traffic.
    pub fn is_alive(&self) -> bool {
        self.liveness.read().is_alive()
    }

    /// Set liveness. Marking alive resets the failure counter.
    pub fn set_alive(&self, alive: bool) {
        self.liveness.write().set_alive(alive);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.liveness.read().consecutive_failures()
    }

    /// Snapshot of the full liveness state.
    pub fn liveness(&self) -> Liveness {
        *self.liveness.read()
    }

    /// Apply a probe result under a single write lock.
    pub fn record_probe(&self, outcome: ProbeOutcome, unhealthy_threshold: u32) -> Option<Transition> {
        self.liveness.write().observe(outcome, unhealthy_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn backend() -> Backend {
        Backend::new(Url::parse("http://127.0.0.1:8081").unwrap())
    }

    #[test]
    fn set_alive_resets_failures() {
        let b = backend();
        b.record_probe(ProbeOutcome::Failure, 3);
        b.record_probe(ProbeOutcome::Failure, 3);
        assert_eq!(b.consecutive_failures(), 2);

        b.set_alive(false);
        assert!(!b.is_alive());
        assert_eq!(b.consecutive_failures(), 2);

        b.set_alive(true);
        assert!(b.is_alive());
        assert_eq!(b.consecutive_failures(), 0);
    }

    #[test]
    fn record_probe_reports_transitions() {
        let b = backend();
        assert_eq!(b.record_probe(ProbeOutcome::Failure, 2), None);
        assert_eq!(b.record_probe(ProbeOutcome::Failure, 2), Some(Transition::WentOffline));
        assert_eq!(b.record_probe(ProbeOutcome::Success, 2), Some(Transition::CameOnline));
        assert_eq!(b.liveness(), Liveness::new());
    }

    #[test]
    fn readers_observe_writer() {
        let b = Arc::new(backend());
        let writer = {
            let b = b.clone();
            std::thread::spawn(move || {
                for _ in 0..3 {
                    b.record_probe(ProbeOutcome::Failure, 3);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let b = b.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let _ = b.is_alive();
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert!(!b.is_alive());
    }
}

//! Round-robin load balancing strategy.

use std::sync::Arc;
use crate::load_balancer::backend::Backend;

/// Round-robin selector.
/// Stores the rotation cursor; the owning pool serializes access to it.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the most recently visited slot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advance through at most one full rotation and return the first alive
    /// backend. The cursor moves even when nothing is alive, so the next call
    /// resumes from a fresh slot.
    pub fn next_alive(&mut self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let len = backends.len();

        for _ in 0..len {
            self.cursor = (self.cursor + 1) % len;
            let backend = &backends[self.cursor];
            if backend.is_alive() {
                return Some(backend.clone());
            }
        }
        None
    }
}

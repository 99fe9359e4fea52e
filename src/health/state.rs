//! Backend liveness state machine.
//!
//! # States
//! - Alive: backend receives traffic (initial state, optimistic)
//! - Dead: backend excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Alive → Dead:  consecutive failures >= unhealthy_threshold
//! Dead  → Alive: one successful probe
//! ```
//!
//! # Design Decisions
//! - Failure is dampened, recovery is immediate
//! - Any success resets the failure counter
//! - Transitions are returned to the caller so they can be logged once

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure,
}

/// A change of liveness produced by [`Liveness::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Alive → Dead.
    WentOffline,
    /// Dead → Alive.
    CameOnline,
}

/// Liveness flag plus the consecutive failure counter that drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    alive: bool,
    consecutive_failures: u32,
}

impl Liveness {
    /// A freshly registered backend is assumed alive.
    pub fn new() -> Self {
        Self {
            alive: true,
            consecutive_failures: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Force the liveness flag. Marking alive clears the failure counter.
    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
        if alive {
            self.consecutive_failures = 0;
        }
    }

    /// Fold one probe result into the state.
    pub fn observe(&mut self, outcome: ProbeOutcome, unhealthy_threshold: u32) -> Option<Transition> {
        match outcome {
            ProbeOutcome::Success => {
                let was_dead = !self.alive;
                self.set_alive(true);
                was_dead.then_some(Transition::CameOnline)
            }
            ProbeOutcome::Failure => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.alive && self.consecutive_failures >= unhealthy_threshold {
                    self.alive = false;
                    return Some(Transition::WentOffline);
                }
                None
            }
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

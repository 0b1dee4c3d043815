//! Opt-in limits on an exploration.
//!
//! Exploration is unbounded by default. A budget is polled by the explorer
//! between steps, so a single long engine step can overrun the wall-clock
//! limit; the limit is best-effort.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Why a budget stopped the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exhausted {
    Steps,
    Time,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    max_steps: Option<u64>,
    timeout: Option<Duration>,
}

impl Budget {
    /// No limits at all
    pub fn unbounded() -> Self {
        Budget::default()
    }

    #[must_use]
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_steps.is_none() && self.timeout.is_none()
    }

    /// Check the budget against the work done since `start`
    pub fn check(&self, steps: u64, start: Instant) -> Option<Exhausted> {
        if let Some(max) = self.max_steps {
            if steps >= max {
                return Some(Exhausted::Steps);
            }
        }

        match self.timeout {
            Some(timeout) if start.elapsed() >= timeout => Some(Exhausted::Time),
            _ => None,
        }
    }
}

use crate::budget::{Budget, Exhausted};
use crate::machine::{Liveness, Machine, StepError};
use crate::manager::{SimulationManager, Stats};
use crate::oracle::{Oracle, Verdict};
use crate::strategy::Strategy;

use colored::Colorize;
use serde::Serialize;
use std::time::{Duration, Instant};

// print a progress line every this many steps in debug mode
const PROGRESS_EVERY: u64 = 10_000;

/// When to stop once a state satisfies the success predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
    /// return the first found state
    First,
    /// keep going until no active states remain
    All,
}

impl Default for StopPolicy {
    fn default() -> Self {
        StopPolicy::First
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Found,
    NotFound,
}

/// Everything an exploration produced
pub struct Exploration<S> {
    pub found: Vec<S>,
    pub stats: Stats,
    /// set if a budget, rather than the state space, ended the search
    pub exhausted: Option<Exhausted>,
    pub elapsed: Duration,
    /// states dropped because the engine failed to step them
    pub errors: Vec<StepError>,
}

impl<S> Exploration<S> {
    pub fn outcome(&self) -> Outcome {
        if self.found.is_empty() {
            Outcome::NotFound
        } else {
            Outcome::Found
        }
    }

    /// the first found state, if any
    pub fn first(self) -> Option<S> {
        self.found.into_iter().next()
    }
}

/// Drives a [`Machine`] through the state space of a program looking for
/// a state whose output satisfies the [`Oracle`].
pub struct Explorer<'m, M: Machine> {
    machine: &'m mut M,
    oracle: Oracle,
    budget: Budget,
    stop: StopPolicy,
    debug: bool,
}

impl<'m, M: Machine> Explorer<'m, M> {
    pub fn new(machine: &'m mut M, oracle: Oracle) -> Self {
        Explorer {
            machine,
            oracle,
            budget: Budget::unbounded(),
            stop: StopPolicy::First,
            debug: false,
        }
    }

    #[must_use]
    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    #[must_use]
    pub fn stop(mut self, stop: StopPolicy) -> Self {
        self.stop = stop;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Search from `seed`, selecting states to step with `strategy`
    pub fn explore(
        &mut self,
        seed: M::State,
        strategy: Box<dyn Strategy<M::State>>,
    ) -> Exploration<M::State> {
        let start = Instant::now();
        let mut manager = SimulationManager::new(strategy);
        manager.activate(seed);

        let mut exhausted = None;
        loop {
            if let Some(reason) = self.budget.check(manager.stats().steps, start) {
                if self.debug {
                    eprintln!("{} {:?} budget exhausted", "[!]".yellow(), reason);
                }
                exhausted = Some(reason);
                break;
            }

            let state = match manager.next() {
                Some(state) => state,
                None => break,
            };

            manager.stepped();
            let written = self.machine.stdout_len(&state);
            match self.machine.step(state) {
                Ok(successors) => {
                    for successor in successors {
                        self.settle(&mut manager, successor, written);
                    }
                }
                Err(err) => {
                    if self.debug {
                        eprintln!("{} dropping state: {}", "[!]".yellow(), err);
                    }
                    manager.error(err);
                }
            }

            if self.stop == StopPolicy::First && manager.has_found() {
                break;
            }

            if self.debug && manager.stats().steps % PROGRESS_EVERY == 0 {
                let stats = manager.stats();
                eprintln!(
                    "[*] {} steps, {} active, {} avoided, {} deadended",
                    stats.steps,
                    manager.active_len(),
                    stats.avoided,
                    stats.deadended
                );
            }
        }

        let (found, stats, errors) = manager.into_parts();
        Exploration {
            found,
            stats,
            exhausted,
            elapsed: start.elapsed(),
            errors,
        }
    }

    /// Classify a freshly stepped state and move it to its partition.
    /// `written` is the stdout length of its parent, output is only
    /// rendered and checked when the step added to it.
    fn settle(
        &mut self,
        manager: &mut SimulationManager<M::State>,
        mut state: M::State,
        written: usize,
    ) {
        let (verdict, output) = if self.machine.stdout_len(&state) == written {
            (Verdict::Continue, vec![])
        } else {
            let output = self.machine.stdout(&mut state);
            (self.oracle.classify(&output), output)
        };

        match verdict {
            Verdict::Avoid => {
                if self.debug {
                    eprintln!("{} {:?}", "[-] avoided".red(), String::from_utf8_lossy(&output));
                }
                manager.avoid(state);
            }
            Verdict::Found => {
                if self.machine.is_sat(&mut state) {
                    if self.debug {
                        eprintln!("{} {:?}", "[+] found".green(), String::from_utf8_lossy(&output));
                    }
                    manager.find(state);
                } else {
                    manager.unsat(state);
                }
            }
            Verdict::Continue => match self.machine.liveness(&mut state) {
                Liveness::Running => manager.activate(state),
                Liveness::Halted => manager.deadend(state),
                Liveness::Unsat => manager.unsat(state),
                Liveness::Faulted => manager.fault(state),
            },
        }
    }
}

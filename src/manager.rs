use crate::machine::StepError;
use crate::strategy::Strategy;
use serde::Serialize;

/// Counters for every partition a state can end up in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub steps: u64,
    pub found: usize,
    pub avoided: usize,
    pub deadended: usize,
    pub unsat: usize,
    pub errored: usize,
    pub peak_active: usize,
}

/// The states of one exploration, partitioned by what happened to them.
///
/// Only the active and found states are kept. Avoided, deadended, unsat
/// and errored states are counted and dropped, none of them is ever
/// stepped again.
pub struct SimulationManager<S> {
    active: Box<dyn Strategy<S>>,
    found: Vec<S>,
    errors: Vec<StepError>,
    stats: Stats,
}

impl<S> SimulationManager<S> {
    pub fn new(active: Box<dyn Strategy<S>>) -> Self {
        SimulationManager {
            active,
            found: vec![],
            errors: vec![],
            stats: Stats::default(),
        }
    }

    pub fn activate(&mut self, state: S) {
        self.active.push(state);
        let len = self.active.len();
        if len > self.stats.peak_active {
            self.stats.peak_active = len;
        }
    }

    /// next state to step, as chosen by the strategy
    pub fn next(&mut self) -> Option<S> {
        self.active.pop()
    }

    pub fn stepped(&mut self) {
        self.stats.steps += 1;
    }

    pub fn find(&mut self, state: S) {
        self.stats.found += 1;
        self.found.push(state);
    }

    pub fn avoid(&mut self, _state: S) {
        self.stats.avoided += 1;
    }

    pub fn deadend(&mut self, _state: S) {
        self.stats.deadended += 1;
    }

    pub fn unsat(&mut self, _state: S) {
        self.stats.unsat += 1;
    }

    /// the engine marked the state as crashed while stepping it
    pub fn fault(&mut self, _state: S) {
        self.stats.errored += 1;
    }

    pub fn error(&mut self, error: StepError) {
        self.stats.errored += 1;
        self.errors.push(error);
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn has_found(&self) -> bool {
        !self.found.is_empty()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn errors(&self) -> &[StepError] {
        &self.errors
    }

    /// Tear down, returning the found states in the order they were found
    pub fn into_parts(self) -> (Vec<S>, Stats, Vec<StepError>) {
        (self.found, self.stats, self.errors)
    }
}

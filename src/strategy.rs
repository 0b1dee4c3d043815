use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::str::FromStr;

/// Ordering policy for the active states of an exploration
pub trait Strategy<S> {
    /// add a state to the worklist
    fn push(&mut self, state: S);

    /// select the next state to step
    fn pop(&mut self) -> Option<S>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Always step the newest state, follows one path to its end first
#[derive(Debug)]
pub struct DepthFirst<S> {
    states: Vec<S>,
}

impl<S> Default for DepthFirst<S> {
    fn default() -> Self {
        DepthFirst { states: vec![] }
    }
}

impl<S> Strategy<S> for DepthFirst<S> {
    fn push(&mut self, state: S) {
        self.states.push(state);
    }

    fn pop(&mut self) -> Option<S> {
        self.states.pop()
    }

    fn len(&self) -> usize {
        self.states.len()
    }
}

/// Step states in the order they were created, all paths advance together
#[derive(Debug)]
pub struct BreadthFirst<S> {
    states: VecDeque<S>,
}

impl<S> Default for BreadthFirst<S> {
    fn default() -> Self {
        BreadthFirst {
            states: VecDeque::new(),
        }
    }
}

impl<S> Strategy<S> for BreadthFirst<S> {
    fn push(&mut self, state: S) {
        self.states.push_back(state);
    }

    fn pop(&mut self) -> Option<S> {
        self.states.pop_front()
    }

    fn len(&self) -> usize {
        self.states.len()
    }
}

/// Pick a uniformly random active state. Seeded, so runs are repeatable
#[derive(Debug)]
pub struct RandomOrder<S> {
    states: Vec<S>,
    rng: StdRng,
}

impl<S> RandomOrder<S> {
    pub fn new(seed: u64) -> Self {
        RandomOrder {
            states: vec![],
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<S> Strategy<S> for RandomOrder<S> {
    fn push(&mut self, state: S) {
        self.states.push(state);
    }

    fn pop(&mut self) -> Option<S> {
        if self.states.is_empty() {
            None
        } else {
            let index = self.rng.gen_range(0..self.states.len());
            Some(self.states.swap_remove(index))
        }
    }

    fn len(&self) -> usize {
        self.states.len()
    }
}

struct Ranked<S> {
    priority: i64,
    sequence: u64,
    state: S,
}

// highest priority first, oldest first among equals
impl<S> Ord for Ranked<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<S> PartialOrd for Ranked<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> PartialEq for Ranked<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for Ranked<S> {}

/// Priority queue over states. The priority function is evaluated once,
/// when a state is pushed; the highest priority is stepped first.
pub struct Prioritized<S> {
    heap: BinaryHeap<Ranked<S>>,
    priority: Box<dyn Fn(&S) -> i64>,
    sequence: u64,
}

impl<S> Prioritized<S> {
    pub fn new<F>(priority: F) -> Self
    where
        F: Fn(&S) -> i64 + 'static,
    {
        Prioritized {
            heap: BinaryHeap::new(),
            priority: Box::new(priority),
            sequence: 0,
        }
    }
}

impl<S> Strategy<S> for Prioritized<S> {
    fn push(&mut self, state: S) {
        let priority = (self.priority)(&state);
        self.sequence += 1;
        self.heap.push(Ranked {
            priority,
            sequence: self.sequence,
            state,
        });
    }

    fn pop(&mut self) -> Option<S> {
        self.heap.pop().map(|ranked| ranked.state)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// The strategies selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[serde(rename = "dfs")]
    DepthFirst,
    #[serde(rename = "bfs")]
    BreadthFirst,
    Random,
    Coverage,
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::BreadthFirst
    }
}

impl StrategyKind {
    pub const NAMES: [&'static str; 4] = ["dfs", "bfs", "random", "coverage"];

    /// Build the worklist. `coverage` uses the given priority function,
    /// the other kinds ignore it.
    pub fn build<S, F>(self, seed: u64, coverage: F) -> Box<dyn Strategy<S>>
    where
        S: 'static,
        F: Fn(&S) -> i64 + 'static,
    {
        match self {
            StrategyKind::DepthFirst => Box::new(DepthFirst::default()),
            StrategyKind::BreadthFirst => Box::new(BreadthFirst::default()),
            StrategyKind::Random => Box::new(RandomOrder::new(seed)),
            StrategyKind::Coverage => Box::new(Prioritized::new(coverage)),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dfs" => Ok(StrategyKind::DepthFirst),
            "bfs" => Ok(StrategyKind::BreadthFirst),
            "random" => Ok(StrategyKind::Random),
            "coverage" => Ok(StrategyKind::Coverage),
            _ => Err(format!("unknown strategy '{}'", s)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StrategyKind::DepthFirst => "dfs",
            StrategyKind::BreadthFirst => "bfs",
            StrategyKind::Random => "random",
            StrategyKind::Coverage => "coverage",
        };
        write!(f, "{}", name)
    }
}

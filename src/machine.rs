use thiserror::Error;

/// Where a state stands after the engine has stepped it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// still has instructions to execute
    Running,
    /// exited or otherwise stopped executing
    Halted,
    /// the path constraints can no longer be satisfied
    Unsat,
    /// the engine gave up on the state (crash, bad memory access)
    Faulted,
}

/// Failure to step a single state. Never fatal to the exploration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("could not decode instruction at 0x{0:08x}")]
    InvalidInstruction(u64),

    #[error("engine fault: {0}")]
    Engine(String),
}

/// The symbolic execution engine as seen by the explorer.
///
/// A machine owns whatever shared context its states need (the loaded
/// binary, the instruction cache, simulated imports) and knows how to
/// advance one state by one unit of execution.
pub trait Machine {
    type State;

    /// Advance `state` by one unit of execution and return every successor.
    /// A branch on symbolic data yields more than one successor, a state
    /// that ran off the end of the program may yield none.
    fn step(&mut self, state: Self::State) -> Result<Vec<Self::State>, StepError>;

    /// Everything written to simulated stdout by this state so far,
    /// concretized under one model of its constraints.
    fn stdout(&mut self, state: &mut Self::State) -> Vec<u8>;

    /// Number of bytes written to simulated stdout, without rendering them.
    /// Output only grows, so an unchanged length means unchanged output.
    fn stdout_len(&mut self, state: &Self::State) -> usize;

    /// Whether the state can still be stepped
    fn liveness(&mut self, state: &mut Self::State) -> Liveness;

    /// Check the path constraints of the state
    fn is_sat(&mut self, state: &mut Self::State) -> bool;
}

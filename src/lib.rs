extern crate boolector;
extern crate radius2;
extern crate serde_json;

/// Opt-in step and time limits
pub mod budget;
/// Command line options
pub mod config;
/// Errors reported to the user
pub mod error;
/// The search loop over execution states
pub mod explorer;
/// Load, explore, and solve a target in one call
pub mod hunt;
/// Shape of the symbolic input
pub mod input;
/// The engine seam the explorer drives
pub mod machine;
/// Partitions of the states of an exploration
pub mod manager;
/// Success and failure classification of program output
pub mod oracle;
/// Worklist orderings
pub mod strategy;
/// radius2 backed machine
pub mod target;
#[cfg(test)]
mod test;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::explorer::{Exploration, Explorer, Outcome, StopPolicy};
pub use crate::machine::{Liveness, Machine, StepError};
pub use crate::oracle::{Oracle, Verdict};
pub use crate::strategy::{Strategy, StrategyKind};
pub use crate::target::Target;

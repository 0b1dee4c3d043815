//! Errors that reach the user. Failures of individual execution states are
//! [`crate::machine::StepError`]s and never leave the explorer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("could not load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("no main or entry0 symbol found in {0}")]
    NoEntry(String),

    #[error("could not concretize the input: {0}")]
    Solve(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 1,
            _ => 2,
        }
    }
}

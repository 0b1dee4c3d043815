use crate::budget::Exhausted;
use crate::config::Config;
use crate::error::Result;
use crate::explorer::{Exploration, Explorer, Outcome};
use crate::input::{decode_ignoring_errors, InputSpec};
use crate::manager::Stats;
use crate::oracle::Oracle;
use crate::target::{Seed, Target};

use serde::Serialize;

/// Line printed when the search comes up empty
pub const NOT_FOUND: &str = "No solution found";

/// What a run produced, printed as plain lines or as JSON
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub outcome: Outcome,
    pub solutions: Vec<String>,
    pub stats: Stats,
    pub exhausted: Option<Exhausted>,
    pub elapsed_ms: u128,
    pub errors: Vec<String>,
}

impl Report {
    /// one solution per line, or the not found message
    pub fn render(&self) -> String {
        if self.solutions.is_empty() {
            format!("{}\n", NOT_FOUND)
        } else {
            self.solutions.iter().map(|s| format!("{}\n", s)).collect()
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Load the target, explore it, and concretize every found input
pub fn hunt(config: &Config) -> Result<Report> {
    let mut target = Target::load(&config.binary, config.trace)?;
    let spec = InputSpec::default();
    let Seed { state, input } = match target.seed(&spec) {
        Ok(seed) => seed,
        Err(err) => {
            target.close();
            return Err(err);
        }
    };

    let oracle = Oracle::new(config.success.as_bytes());
    let strategy = config.strategy.build(config.seed, Target::coverage);

    let Exploration {
        found,
        stats,
        exhausted,
        elapsed,
        errors,
    } = Explorer::new(&mut target, oracle)
        .budget(config.budget())
        .stop(config.stop_policy())
        .debug(config.verbose)
        .explore(state, strategy);

    let mut errors: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    let solutions = concretize(found, &spec, &mut errors, |state| {
        Target::solve(state, &input)
    });
    target.close();

    let outcome = if solutions.is_empty() {
        Outcome::NotFound
    } else {
        Outcome::Found
    };

    Ok(Report {
        config: config.clone(),
        outcome,
        solutions,
        stats,
        exhausted,
        elapsed_ms: elapsed.as_millis(),
        errors,
    })
}

/// Solve and decode every found state. A state that cannot be solved, or
/// whose model falls outside the input charset, is reported in `errors`
/// and the others are kept.
fn concretize<S, F>(
    found: Vec<S>,
    spec: &InputSpec,
    errors: &mut Vec<String>,
    mut solve: F,
) -> Vec<String>
where
    F: FnMut(&mut S) -> Result<Vec<u8>>,
{
    let mut solutions = Vec::with_capacity(found.len());
    for mut state in found {
        match solve(&mut state) {
            Ok(bytes) if spec.admits(&bytes) => solutions.push(decode_ignoring_errors(&bytes)),
            Ok(bytes) => errors.push(format!("solution {:?} is outside the input charset", bytes)),
            Err(err) => errors.push(err.to_string()),
        }
    }
    solutions
}

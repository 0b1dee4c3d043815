use crate::budget::Budget;
use crate::error::{Error, Result};
use crate::explorer::StopPolicy;
use crate::strategy::StrategyKind;

use clap::{App, Arg, ArgMatches};
use serde::Serialize;
use std::time::Duration;

/// Options of one solver run. Everything but the two positional arguments
/// is an opt-in extension with a default matching plain `flaghunt BIN STR`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub binary: String,
    pub success: String,
    pub strategy: StrategyKind,
    pub seed: u64,
    pub max_steps: Option<u64>,
    pub timeout: Option<u64>,
    pub all: bool,
    pub verbose: bool,
    pub trace: bool,
    pub json: bool,
}

impl Config {
    pub fn new(binary: &str, success: &str) -> Self {
        Config {
            binary: binary.to_owned(),
            success: success.to_owned(),
            strategy: StrategyKind::default(),
            seed: 0,
            max_steps: None,
            timeout: None,
            all: false,
            verbose: false,
            trace: false,
            json: false,
        }
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        // both are required, clap has already rejected their absence
        let binary = matches.value_of("binary").unwrap_or_default();
        let success = matches.value_of("success").unwrap_or_default();
        let mut config = Config::new(binary, success);

        if let Some(strategy) = matches.value_of("strategy") {
            config.strategy = strategy.parse().map_err(Error::Usage)?;
        }
        if let Some(seed) = matches.value_of("seed") {
            config.seed = parse_number("seed", seed)?;
        }
        if let Some(steps) = matches.value_of("max_steps") {
            config.max_steps = Some(parse_number("max-steps", steps)?);
        }
        if let Some(secs) = matches.value_of("timeout") {
            config.timeout = Some(parse_number("timeout", secs)?);
        }

        config.all = matches.occurrences_of("all") > 0;
        config.verbose = matches.occurrences_of("verbose") > 0;
        config.trace = matches.occurrences_of("trace") > 0;
        config.json = matches.occurrences_of("json") > 0;
        Ok(config)
    }

    pub fn budget(&self) -> Budget {
        let mut budget = Budget::unbounded();
        if let Some(steps) = self.max_steps {
            budget = budget.with_max_steps(steps);
        }
        if let Some(secs) = self.timeout {
            budget = budget.with_timeout(Duration::from_secs(secs));
        }
        budget
    }

    pub fn stop_policy(&self) -> StopPolicy {
        if self.all {
            StopPolicy::All
        } else {
            StopPolicy::First
        }
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::Usage(format!("--{} expects a number, got '{}'", name, value)))
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("flaghunt")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Austin Emmitt <aemmitt@nowsecure.com>")
        .about("Find the stdin input that makes a binary print a success message")
        .arg(
            Arg::with_name("binary")
                .index(1)
                .required(true)
                .help("Path to the target binary"),
        )
        .arg(
            Arg::with_name("success")
                .index(2)
                .required(true)
                .help("Substring of stdout that marks the right input"),
        )
        .arg(
            Arg::with_name("strategy")
                .short("s")
                .long("strategy")
                .takes_value(true)
                .possible_values(&StrategyKind::NAMES)
                .help("Order in which active states are stepped [default: bfs]"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("Seed for the random strategy"),
        )
        .arg(
            Arg::with_name("max_steps")
                .long("max-steps")
                .takes_value(true)
                .help("Give up after this many steps"),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .takes_value(true)
                .help("Give up after this many seconds"),
        )
        .arg(
            Arg::with_name("all")
                .short("a")
                .long("all")
                .help("Keep exploring after the first solution"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Show progress and dropped states on stderr"),
        )
        .arg(
            Arg::with_name("trace")
                .short("t")
                .long("trace")
                .conflicts_with("json")
                .help("Print every executed instruction (written to stdout)"),
        )
        .arg(
            Arg::with_name("json")
                .short("j")
                .long("json")
                .help("Print a JSON report"),
        )
}

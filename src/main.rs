use flaghunt::config::{app, Config};
use flaghunt::hunt::hunt;

use colored::Colorize;
use std::process;

fn main() {
    // missing arguments exit with 1 and usage on stderr
    let matches = app().get_matches_safe().unwrap_or_else(|err| err.exit());

    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "error:".red(), err);
            process::exit(err.exit_code());
        }
    };

    match hunt(&config) {
        Ok(report) if config.json => println!("{}", report.to_json()),
        Ok(report) => print!("{}", report.render()),
        Err(err) => {
            eprintln!("{} {}", "error:".red(), err);
            process::exit(err.exit_code());
        }
    }
}

//! strata binary entry point.

use std::process::ExitCode;

use strata::cli::{self, Cli, Outcome};
use strata::ui::output;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "STRATA_LOG";

fn install_tracing_subscriber(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let args = Cli::parse_args();
    install_tracing_subscriber(args.debug);

    match cli::run(args) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NoResult) => ExitCode::from(1),
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::from(cli::exit_code(&err))
        }
    }
}

//! geoselect CLI - Command-line interface
//!
//! Thin adapter over geoselect-core and geoselect-geo.

mod center;
mod cli;
mod commands;
mod errors;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;
use output::OutputWriter;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable in --json mode
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            output.error(format!("Failed to start async runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::execute(cli, &output)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            errors::report(&error, &output);
            ExitCode::FAILURE
        }
    }
}

//! Binary entry point for the chromalog CLI.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

fn main() -> ExitCode {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);

    match commands::execute(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for --json consumers.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chromalog=debug,chromalog_core=debug"
    } else {
        "chromalog=warn,chromalog_core=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

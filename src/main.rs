//! vkrpack - Validate, convert and merge thesis documents into a single PDF.

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use vkrpack::cli::Cli;
use vkrpack::output::OutputFormatter;
use vkrpack::{Config, Error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::try_from(&cli) {
        Ok(config) => config,
        Err(err) => exit_with(&OutputFormatter::default(), err),
    };

    init_tracing(&config);

    let formatter = OutputFormatter::from_config(&config);
    if let Err(err) = vkrpack::run(cli.command, config).await {
        exit_with(&formatter, err);
    }
}

/// Log to stderr, filtered by `RUST_LOG` or the verbosity flags.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with(formatter: &OutputFormatter, err: Error) -> ! {
    formatter.error(&format!("Error: {err}"));
    process::exit(err.exit_code());
}

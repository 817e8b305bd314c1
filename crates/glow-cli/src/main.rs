//! Glow Score CLI - Multi-angle facial glow analysis.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let outcome = match cli.command {
        Some(Commands::Analyze(args)) => {
            commands::analyze::run(&args.with_config(&config), &config).await
        }
        Some(Commands::Validate(args)) => commands::validate::run(&args, &config).await,
        // Default behavior: analyze with flattened args
        None => commands::analyze::run(&cli.analyze.with_config(&config), &config).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
    .into()
}

//! Maestro CLI: the main entry point.
//!
//! Commands:
//! - `run`    : Join the room and route messages
//! - `status` : Show the effective configuration
//! - `doctor` : Check configuration, oracle and presence reachability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "maestro",
    about = "Maestro: routes chat room messages to whoever should answer next",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the key=value configuration file
    #[arg(long, global = true, default_value = ".env", env = "MAESTRO_ENV_FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the configured room and start routing
    Run,

    /// Show the effective configuration (secrets redacted)
    Status,

    /// Diagnose configuration and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run => commands::run::run(&cli.env_file).await?,
        Commands::Status => commands::status::run(&cli.env_file).await?,
        Commands::Doctor => commands::doctor::run(&cli.env_file).await?,
    }

    Ok(())
}

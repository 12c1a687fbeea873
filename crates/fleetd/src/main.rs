//! fleetd entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleetd::{AppState, Config};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetd", version, about = "Fleet telemetry interpretation daemon")]
struct Cli {
    /// Config file path. Overrides FLEETD_CONFIG and the default location.
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP daemon (default).
    Serve,
    /// Interpret one VIN and print the result as JSON.
    InterpretVin { vin: String },
    /// Interpret one cohort and print the result as JSON.
    InterpretCohort { cohort_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };

    let state = Arc::new(AppState::from_config(config)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => fleetd::server::serve(state).await,
        Command::InterpretVin { vin } => {
            let interpretation = state.interpret_vin(&vin)?;
            println!("{}", serde_json::to_string_pretty(&interpretation)?);
            Ok(())
        }
        Command::InterpretCohort { cohort_id } => {
            let interpretation = state.interpret_cohort(&cohort_id, None)?;
            println!("{}", serde_json::to_string_pretty(&interpretation)?);
            Ok(())
        }
    }
}

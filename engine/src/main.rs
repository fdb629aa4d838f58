// Genoflow Batch Genotyping Engine
// Main entry point for the genoflow binary

use clap::Parser;
use genoflow_engine::cli::{Cli, Command};
use genoflow_engine::config::Config;
use genoflow_engine::handlers::{handle_check, handle_run};
use genoflow_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    tracing::info!("Genoflow Engine v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load()?
    };

    // Re-initialize telemetry with the CLI or config-driven log level
    // (only takes effect if RUST_LOG env var is not set)
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    match cli.command {
        Command::Run(args) => {
            tracing::info!("Starting run '{}'", args.run_name);
            let completed = handle_run(args, &config).await?;
            if !completed {
                // Business failure: no result tuple, nonzero exit
                std::process::exit(1);
            }
            Ok(())
        }

        Command::Check { db } => {
            tracing::info!("Checking deployment...");
            handle_check(db, &config).await
        }
    }
}

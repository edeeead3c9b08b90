//! Fortell CLI entry point.

use anyhow::Result;
use clap::Parser;
use fortell::cli::{commands, Cli, Commands};
use fortell::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("fortell={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Crawl { place_config, run_id } => {
            commands::run_crawl(place_config, run_id.clone(), settings).await?;
        }

        Commands::Script { bronze, run_id } => {
            commands::run_script(bronze, run_id.clone(), settings).await?;
        }

        Commands::Audio { silver, run_id } => {
            commands::run_audio(silver, run_id.clone(), settings).await?;
        }

        Commands::Publish { gold, run_id } => {
            commands::run_publish(gold, run_id.clone(), settings).await?;
        }

        Commands::Run { place_config, run_id, no_publish } => {
            commands::run_full(place_config, run_id.clone(), *no_publish, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}

//! Casebook CLI entry point.

use anyhow::Result;
use casebook::cli::{commands, Cli, Commands};
use casebook::config::Settings;
use clap::Parser;
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
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("casebook={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Execute command
    match cli.command {
        Commands::Extract { input, output } => {
            commands::run_extract(input, output, &settings)?;
        }

        Commands::Chunk { input, output } => {
            commands::run_chunk(input, output, &settings)?;
        }

        Commands::Index { input } => {
            commands::run_index(input, &settings).await?;
        }

        Commands::Ask { question, top_k } => {
            commands::run_ask(&question, top_k, &settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(&query, limit, &settings).await?;
        }

        Commands::Chat => {
            commands::run_chat(&settings).await?;
        }

        Commands::Status => {
            commands::run_status(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, &settings)?;
        }
    }

    Ok(())
}

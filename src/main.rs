use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch::config::Config;
use stockwatch::models::SourceKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "stockwatch",
    version,
    about = "Grow a Garden shop stock tracker with primary/fallback source failover",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (skipped if missing)
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stock, restoration and weather loops until Ctrl-C
    Run,

    /// Fetch one snapshot and print the consumer view as JSON
    Fetch,

    /// Run one evaluated cycle (updates failover state)
    Cycle,

    /// Probe both sources
    Health,

    /// Show persisted failover state
    Status,

    /// Force the stock source
    Switch {
        /// Target source (primary, fallback)
        source: SourceKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(Some(cli.config.as_path()))?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Run => {
            tracing::info!("Starting run command");
            commands::run(config).await?;
        }
        Commands::Fetch => commands::fetch(&config).await?,
        Commands::Cycle => commands::cycle(&config).await?,
        Commands::Health => commands::health(&config).await?,
        Commands::Status => commands::status(&config)?,
        Commands::Switch { source } => {
            tracing::info!(source = %source, "Starting switch command");
            commands::switch(&config, source).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("stockwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("stockwatch={level},warn"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

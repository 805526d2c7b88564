use anyhow::Result;
use std::sync::Arc;

use stockwatch::config::Config;
use stockwatch::scheduler::StockScheduler;

use super::{build_notifier, Components};

pub async fn run(config: Config) -> Result<()> {
    let components = Components::build(&config)?;
    let notifier = build_notifier(&config)?;

    let mode = components.controller.mode().await;
    println!("Stockwatch");
    println!("==========");
    println!("  Source: {mode}");
    println!("  Primary: {}", config.sources.primary_url);
    println!("  State file: {}", config.storage.state_path.display());
    println!("  Cycle interval: {}s", config.schedule.interval_secs);
    println!("\nPress Ctrl+C to stop\n");

    let scheduler = StockScheduler::new(Arc::clone(&components.pipeline), notifier, config);
    scheduler.run().await;

    Ok(())
}

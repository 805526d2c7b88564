use anyhow::{Context, Result};

use stockwatch::config::Config;
use stockwatch::failover::{FailoverState, HealthReport};
use stockwatch::models::SourceKind;
use stockwatch::notify::StockEvent;
use stockwatch::storage::StateStore;

use super::{build_notifier, Components};

/// Print one snapshot's consumer view
pub async fn fetch(config: &Config) -> Result<()> {
    let components = Components::build(config)?;
    let (source, snapshot) = components
        .pipeline
        .fetch_all_at(stockwatch::utils::unix_now())
        .await;

    tracing::info!(source = %source, items = snapshot.total_items(), "Snapshot fetched");
    println!("{}", serde_json::to_string_pretty(&snapshot.consumer_view())?);
    Ok(())
}

/// Run and print one evaluated cycle
pub async fn cycle(config: &Config) -> Result<()> {
    let components = Components::build(config)?;
    let report = components.pipeline.run_cycle().await;

    if let Some(transition) = &report.outcome.transition {
        let notifier = build_notifier(config)?;
        if let Err(e) = notifier
            .notify(&StockEvent::SourceSwitched(transition.clone()))
            .await
        {
            tracing::error!(error = %e, "Notification failed");
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Probe both sources
pub async fn health(config: &Config) -> Result<()> {
    let components = Components::build(config)?;
    let state = components.controller.snapshot_state().await;
    let report = HealthReport::collect(&components.secondary, components.probe.as_ref(), &state).await;

    println!("Health: {}", report.status().as_str());
    println!("  Primary (reachable and fresh): {}", mark(report.primary));
    for (endpoint, up) in &report.endpoints {
        println!("  API {endpoint}: {}", mark(*up));
    }
    println!(
        "  Current source: {}",
        if report.using_fallback { "fallback" } else { "primary" }
    );
    Ok(())
}

/// Print the persisted state
pub fn status(config: &Config) -> Result<()> {
    let store = StateStore::new(&config.storage.state_path);
    let state: FailoverState = store
        .load()
        .with_context(|| format!("Failed to read {}", store.path().display()))?
        .unwrap_or_default();

    println!("Source: {}", state.mode());
    println!("Repeated data count: {}", state.repeated_data_count);
    match state.switch_time {
        Some(at) => println!("Fallback since: {at}"),
        None => println!("Fallback since: -"),
    }
    println!(
        "Last weather alert: {}",
        state.last_weather_alert.as_deref().unwrap_or("-")
    );
    if let Some(last) = &state.last_data {
        println!("Last data: {} items at {}", last.total_items(), last.fetched_at);
    }
    Ok(())
}

/// Force the source
///
/// Writes the state file; a running daemon adopts the change on its next
/// controller access.
pub async fn switch(config: &Config, source: SourceKind) -> Result<()> {
    let components = Components::build(config)?;

    match components.controller.force_source(source).await {
        Some(transition) => {
            println!("Switched: {transition}");
            let notifier = build_notifier(config)?;
            if let Err(e) = notifier
                .notify(&StockEvent::SourceSwitched(transition))
                .await
            {
                tracing::error!(error = %e, "Notification failed");
            }
        }
        None => println!("Already using {source}; repeat counter reset"),
    }
    Ok(())
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "down"
    }
}

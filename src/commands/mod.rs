pub mod inspect;
pub mod run;

use anyhow::{Context, Result};
use std::sync::Arc;

use stockwatch::config::Config;
use stockwatch::failover::{FailoverController, PrimaryHealthProbe};
use stockwatch::notify::{LogNotifier, Notifier, WebhookConfig, WebhookNotifier};
use stockwatch::pipeline::SnapshotPipeline;
use stockwatch::sources::{PrimarySource, SecondarySource};
use stockwatch::storage::StateStore;

// Re-export command functions for convenience
pub use inspect::{cycle, fetch, health, status, switch};
pub use run::run;

/// Components wired once per process
pub struct Components {
    pub secondary: Arc<SecondarySource>,
    pub probe: Arc<PrimaryHealthProbe>,
    pub controller: Arc<FailoverController>,
    pub pipeline: Arc<SnapshotPipeline>,
}

impl Components {
    pub fn build(config: &Config) -> Result<Self> {
        let primary =
            Arc::new(PrimarySource::from_config(config).context("Failed to create primary source")?);
        let secondary = Arc::new(
            SecondarySource::from_config(config).context("Failed to create secondary source")?,
        );
        let probe = Arc::new(
            PrimaryHealthProbe::new(Arc::clone(&primary)).with_timeout(config.timeouts.health()),
        );

        let controller = Arc::new(FailoverController::new(
            StateStore::new(&config.storage.state_path),
            probe.clone(),
            config.failover.clone(),
        ));

        let pipeline = Arc::new(SnapshotPipeline::new(
            primary,
            secondary.clone(),
            Arc::clone(&controller),
        ));

        Ok(Self {
            secondary,
            probe,
            controller,
            pipeline,
        })
    }
}

/// Webhook notifier when configured, log notifier otherwise
pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    match WebhookConfig::from_notify_config(&config.notify) {
        Some(webhook) => {
            let notifier = WebhookNotifier::new(webhook).context("Failed to create webhook notifier")?;
            tracing::info!(url = %notifier.url(), "Webhook notifications enabled");
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::info!("No webhook configured, notifications go to the log");
            Ok(Arc::new(LogNotifier))
        }
    }
}

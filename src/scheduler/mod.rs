//! Cycle scheduling
//!
//! Three cooperative loops share one [`SnapshotPipeline`] and therefore one
//! failover controller:
//!
//! - **stock loop**: wakes at each `interval_secs` wall-clock boundary plus a
//!   settle delay (longer on the fallback source), runs a cycle through
//!   [`StockScheduler::retry_cycle`], and notifies on fresh data and source
//!   switches.
//! - **restoration monitor**: while on fallback, waits out the dwell time and
//!   then probes the primary every `restore_check_interval_secs`.
//! - **weather watch**: wakes every minute, reads one snapshot and alerts on
//!   special weather once per distinct value.
//!
//! Nothing inside a cycle can end a loop. All loops stop on Ctrl-C or
//! [`StockScheduler::stop`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::Config;
use crate::models::{Category, StockSnapshot};
use crate::notify::{is_special_weather, weather_alert_text, Notifier, StockEvent};
use crate::pipeline::{CycleReport, SnapshotPipeline};
use crate::utils::retry::{retry_until, Attempted};
use crate::utils::unix_now;

/// Delay from `now` until the next `interval_secs` boundary plus `settle_secs`
pub fn next_tick_delay(now: i64, interval_secs: u64, settle_secs: u64) -> Duration {
    let interval = interval_secs.max(1) as i64;
    let next_boundary = (now.div_euclid(interval) + 1) * interval;
    Duration::from_secs((next_boundary - now) as u64 + settle_secs)
}

/// Drives the acquisition, restoration and weather loops
pub struct StockScheduler {
    pipeline: Arc<SnapshotPipeline>,
    notifier: Arc<dyn Notifier>,
    config: Config,
    shutdown: watch::Sender<bool>,
}

impl StockScheduler {
    pub fn new(pipeline: Arc<SnapshotPipeline>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            pipeline,
            notifier,
            config,
            shutdown,
        }
    }

    pub fn pipeline(&self) -> &Arc<SnapshotPipeline> {
        &self.pipeline
    }

    /// Ask every loop to exit at its next wait
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run all loops until Ctrl-C or [`stop`](Self::stop)
    pub async fn run(&self) {
        tracing::info!("Scheduler started");

        let signal = async {
            let mut rx = self.shutdown.subscribe();
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("Shutdown signal received"),
                        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
                    }
                    self.stop();
                }
                _ = rx.wait_for(|stopped| *stopped) => {}
            }
        };

        tokio::join!(
            self.run_stock_loop(),
            self.run_restore_monitor(),
            self.run_weather_watch(),
            signal,
        );

        tracing::info!("Scheduler stopped");
    }

    // ========================================================================
    // Stock loop
    // ========================================================================

    pub async fn run_stock_loop(&self) {
        let schedule = &self.config.schedule;

        loop {
            let settle = if self.pipeline.controller().should_use_fallback().await {
                schedule.fallback_settle_secs
            } else {
                schedule.primary_settle_secs
            };
            let delay = next_tick_delay(unix_now(), schedule.interval_secs, settle);
            tracing::info!(wait_secs = delay.as_secs(), "Next stock cycle scheduled");

            if !self.sleep_or_stop(delay).await {
                break;
            }
            self.run_once().await;
        }
    }

    /// Run a cycle until it yields new data or a switch, up to the attempt cap
    pub async fn retry_cycle(&self) -> Attempted<CycleReport> {
        let schedule = &self.config.schedule;
        retry_until(
            schedule.cycle_attempts,
            Duration::from_secs(schedule.cycle_retry_delay_secs),
            || self.pipeline.run_cycle(),
            CycleReport::is_actionable,
        )
        .await
    }

    /// One scheduled cycle including notifications
    pub async fn run_once(&self) -> CycleReport {
        let attempted = self.retry_cycle().await;
        if !attempted.accepted {
            tracing::info!(
                attempts = attempted.attempts,
                "No new data this cycle, waiting for next tick"
            );
        }

        self.dispatch(&attempted.value).await;
        attempted.value
    }

    async fn dispatch(&self, report: &CycleReport) {
        if let Some(transition) = &report.outcome.transition {
            self.send(StockEvent::SourceSwitched(transition.clone())).await;
        }

        if report.outcome.fresh && self.config.notify.post_updates {
            self.send(StockEvent::StockUpdate(report.snapshot.clone())).await;
        }
    }

    // ========================================================================
    // Restoration monitor
    // ========================================================================

    pub async fn run_restore_monitor(&self) {
        let interval = Duration::from_secs(self.config.failover.restore_check_interval_secs);
        let controller = Arc::clone(self.pipeline.controller());

        loop {
            if controller.should_use_fallback().await {
                if let Some(remaining) = controller.dwell_remaining().await {
                    if !remaining.is_zero() {
                        tracing::info!(
                            wait_secs = remaining.as_secs(),
                            "Waiting for minimum fallback dwell before probing primary"
                        );
                        if !self.sleep_or_stop(remaining).await {
                            break;
                        }
                    }
                }

                if let Some(transition) = controller.try_restore().await {
                    self.send(StockEvent::SourceSwitched(transition)).await;
                }
            }

            if !self.sleep_or_stop(interval).await {
                break;
            }
        }
    }

    // ========================================================================
    // Weather watch
    // ========================================================================

    pub async fn run_weather_watch(&self) {
        let schedule = &self.config.schedule;

        loop {
            let delay = next_tick_delay(
                unix_now(),
                schedule.weather_interval_secs,
                schedule.weather_settle_secs,
            );
            if !self.sleep_or_stop(delay).await {
                break;
            }

            let snapshot = self.pipeline.fetch_all().await;
            self.check_weather(&snapshot).await;
        }
    }

    /// Alert on special weather; returns the alert text when one was sent
    pub async fn check_weather(&self, snapshot: &StockSnapshot) -> Option<String> {
        let current = snapshot.get(Category::Weather).first()?;

        if !is_special_weather(current) {
            tracing::debug!(weather = %current, "Routine weather");
            return None;
        }

        if !self
            .pipeline
            .controller()
            .record_weather_alert(current)
            .await
        {
            tracing::debug!(weather = %current, "Weather already alerted");
            return None;
        }

        let text = weather_alert_text(current);
        tracing::info!(weather = %text, "Special weather");
        self.send(StockEvent::WeatherAlert(text.clone())).await;
        Some(text)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn send(&self, event: StockEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            tracing::error!(
                notifier = self.notifier.name(),
                event = event.kind(),
                error = %e,
                "Notification failed"
            );
        }
    }

    /// Sleep unless stopped first; false means stop
    async fn sleep_or_stop(&self, duration: Duration) -> bool {
        let mut rx = self.shutdown.subscribe();
        if *rx.borrow_and_update() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => !*rx.borrow(),
            _ = rx.changed() => false,
        }
    }
}

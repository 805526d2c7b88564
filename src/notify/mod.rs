//! Outbound notifications
//!
//! Events are delivered through a [`Notifier`]. [`WebhookNotifier`] posts to
//! a chat webhook; [`LogNotifier`] only logs. Delivery failures are reported
//! to the caller, which logs them and carries on.

pub mod webhook;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::failover::Transition;
use crate::models::{Category, StockSnapshot};

pub use webhook::{WebhookConfig, WebhookNotifier};

/// Weather kinds that are routine and never alerted on
const ROUTINE_WEATHER: &[&str] = &["rain", "frost", "snow", "windy"];

/// Suffix the stock page appends to the latest weather
const MOST_RECENT_SUFFIX: &str = " - Most Recent";

/// Errors raised while delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid notifier configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NotifyError {
    /// Whether a later attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidConfig(_) => false,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Something worth telling the community about
#[derive(Debug, Clone, PartialEq)]
pub enum StockEvent {
    /// Data source changed
    SourceSwitched(Transition),
    /// Fresh stock arrived
    StockUpdate(StockSnapshot),
    /// Special weather started; carries the display text
    WeatherAlert(String),
}

impl StockEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceSwitched(_) => "source_switched",
            Self::StockUpdate(_) => "stock_update",
            Self::WeatherAlert(_) => "weather_alert",
        }
    }

    /// One-line plain text description
    pub fn summary(&self) -> String {
        match self {
            Self::SourceSwitched(transition) => format!("Stock source switched: {transition}"),
            Self::StockUpdate(snapshot) => {
                let parts: Vec<String> = Category::ALL
                    .into_iter()
                    .filter(|c| !snapshot.get(*c).is_empty())
                    .map(|c| format!("{}: {}", c, snapshot.get(c).join(", ")))
                    .collect();
                if parts.is_empty() {
                    "Stock update: nothing in stock".to_string()
                } else {
                    format!("Stock update | {}", parts.join(" | "))
                }
            }
            Self::WeatherAlert(weather) => format!("Weather alert: {weather}"),
        }
    }
}

impl fmt::Display for StockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// True for weather that is not one of the routine kinds
pub fn is_special_weather(weather: &str) -> bool {
    let lower = weather.to_lowercase();
    !ROUTINE_WEATHER.iter().any(|kind| lower.contains(kind))
}

/// Alert text for a weather entry, without the "most recent" marker
pub fn weather_alert_text(weather: &str) -> String {
    weather.replace(MOST_RECENT_SUFFIX, "").trim().to_string()
}

// ============================================================================
// Notifiers
// ============================================================================

/// Delivery target for [`StockEvent`]s
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, event: &StockEvent) -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, event: &StockEvent) -> Result<(), NotifyError> {
        tracing::info!(event = event.kind(), "{}", event.summary());
        Ok(())
    }
}

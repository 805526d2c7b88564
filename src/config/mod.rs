//! Configuration management for stockwatch
//!
//! Configuration is loaded from a TOML file (every section optional) and then
//! overridden by `STOCKWATCH_*` environment variables. Defaults reproduce the
//! production cadence: 5-minute cycles, 15-minute fallback dwell, 3/5 repeat
//! thresholds.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source locations
    pub sources: SourcesConfig,

    /// Network timeouts and navigation retry
    pub timeouts: TimeoutConfig,

    /// Failover thresholds
    pub failover: FailoverConfig,

    /// Cycle cadence
    pub schedule: ScheduleConfig,

    /// State file location
    pub storage: StorageConfig,

    /// Notification delivery
    pub notify: NotifyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Source endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Primary HTML stock page
    pub primary_url: String,

    /// Secondary API: gear and seeds
    pub gear_seeds_url: String,

    /// Secondary API: eggs
    pub egg_url: String,

    /// Secondary API: limited event shop
    pub honey_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary_url: String::from("https://growagardenvalues.com/stock/stocks.php"),
            gear_seeds_url: String::from("https://growagardenstock.com/api/stock?type=gear-seeds"),
            egg_url: String::from("https://growagardenstock.com/api/stock?type=egg"),
            honey_url: String::from("https://growagardenstock.com/api/special-stock?type=honey"),
        }
    }
}

/// Timeouts and navigation retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Primary page navigation timeout
    pub navigation_secs: u64,

    /// Secondary API request timeout
    pub api_secs: u64,

    /// Lightweight health probe timeout
    pub health_secs: u64,

    /// Page navigation attempts per fetch
    pub navigation_attempts: u32,

    /// First backoff delay between navigation attempts (doubles each time)
    pub backoff_base_ms: u64,

    /// Backoff ceiling
    pub backoff_max_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_secs: 30,
            api_secs: 10,
            health_secs: 5,
            navigation_attempts: 3,
            backoff_base_ms: 2000,
            backoff_max_ms: 8000,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    #[must_use]
    pub fn api(&self) -> Duration {
        Duration::from_secs(self.api_secs)
    }

    #[must_use]
    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    /// Backoff policy for page navigation
    #[must_use]
    pub fn navigation_retry(&self) -> RetryConfig {
        RetryConfig::with_delays(
            self.navigation_attempts.saturating_sub(1),
            self.backoff_base_ms,
            self.backoff_max_ms,
        )
    }
}

/// Failover thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Repeated `seeds` cycles before the primary is probed
    pub probe_after_repeats: u32,

    /// Repeated `seeds` cycles that force a switch regardless of the probe
    pub force_after_repeats: u32,

    /// Minimum time in fallback before restoration is considered
    pub min_dwell_secs: i64,

    /// Interval between restoration probes while in fallback
    pub restore_check_interval_secs: u64,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            probe_after_repeats: 3,
            force_after_repeats: 5,
            min_dwell_secs: 900,
            restore_check_interval_secs: 900,
        }
    }
}

/// Cycle cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Wall-clock boundary cycles align to
    pub interval_secs: u64,

    /// Extra wait past the boundary when reading the primary source
    pub primary_settle_secs: u64,

    /// Extra wait past the boundary when reading the fallback source
    pub fallback_settle_secs: u64,

    /// Whole-cycle attempts when no new data arrives
    pub cycle_attempts: u32,

    /// Fixed delay between whole-cycle attempts
    pub cycle_retry_delay_secs: u64,

    /// Wall-clock boundary weather checks align to
    pub weather_interval_secs: u64,

    /// Extra wait past the weather boundary
    pub weather_settle_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            primary_settle_secs: 7,
            fallback_settle_secs: 90,
            cycle_attempts: 5,
            cycle_retry_delay_secs: 5,
            weather_interval_secs: 60,
            weather_settle_secs: 7,
        }
    }
}

/// State persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON state file
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("bot_cache.json"),
        }
    }
}

/// Notification delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Chat webhook URL; events are only logged when absent
    pub webhook_url: Option<String>,

    /// Webhook request timeout
    pub timeout_secs: u64,

    /// Webhook retries on 429/5xx
    pub max_retries: u32,

    /// Post every fresh snapshot, not only source switches and weather
    pub post_updates: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
            max_retries: 3,
            post_updates: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from defaults and environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when it exists, then apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `STOCKWATCH_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_string("STOCKWATCH_PRIMARY_URL") {
            self.sources.primary_url = v;
        }
        if let Some(v) = env_string("STOCKWATCH_GEAR_SEEDS_URL") {
            self.sources.gear_seeds_url = v;
        }
        if let Some(v) = env_string("STOCKWATCH_EGG_URL") {
            self.sources.egg_url = v;
        }
        if let Some(v) = env_string("STOCKWATCH_HONEY_URL") {
            self.sources.honey_url = v;
        }
        if let Some(v) = env_parse("STOCKWATCH_NAVIGATION_TIMEOUT")? {
            self.timeouts.navigation_secs = v;
        }
        if let Some(v) = env_parse("STOCKWATCH_API_TIMEOUT")? {
            self.timeouts.api_secs = v;
        }
        if let Some(v) = env_parse("STOCKWATCH_HEALTH_TIMEOUT")? {
            self.timeouts.health_secs = v;
        }
        if let Some(v) = env_parse("STOCKWATCH_MIN_DWELL_SECS")? {
            self.failover.min_dwell_secs = v;
        }
        if let Some(v) = env_parse("STOCKWATCH_INTERVAL_SECS")? {
            self.schedule.interval_secs = v;
        }
        if let Some(v) = env_string("STOCKWATCH_STATE_PATH") {
            self.storage.state_path = PathBuf::from(v);
        }
        if let Some(v) = env_string("STOCKWATCH_WEBHOOK_URL") {
            self.notify.webhook_url = Some(v);
        }
        if let Some(v) = env_string("STOCKWATCH_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env_string("STOCKWATCH_LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sources.primary_url", &self.sources.primary_url),
            ("sources.gear_seeds_url", &self.sources.gear_seeds_url),
            ("sources.egg_url", &self.sources.egg_url),
            ("sources.honey_url", &self.sources.honey_url),
        ] {
            validate_http_url(name, value)?;
        }

        if let Some(webhook) = &self.notify.webhook_url {
            validate_http_url("notify.webhook_url", webhook)?;
        }

        if self.timeouts.navigation_secs == 0
            || self.timeouts.api_secs == 0
            || self.timeouts.health_secs == 0
        {
            anyhow::bail!("timeouts must be greater than 0");
        }

        if self.timeouts.navigation_attempts == 0 {
            anyhow::bail!("timeouts.navigation_attempts must be at least 1");
        }

        if self.failover.probe_after_repeats == 0 {
            anyhow::bail!("failover.probe_after_repeats must be at least 1");
        }

        if self.failover.force_after_repeats < self.failover.probe_after_repeats {
            anyhow::bail!("failover.force_after_repeats must not be below probe_after_repeats");
        }

        if self.failover.min_dwell_secs < 0 {
            anyhow::bail!("failover.min_dwell_secs must not be negative");
        }

        if self.failover.restore_check_interval_secs == 0 {
            anyhow::bail!("failover.restore_check_interval_secs must be greater than 0");
        }

        if self.schedule.interval_secs == 0 {
            anyhow::bail!("schedule.interval_secs must be greater than 0");
        }

        if self.schedule.cycle_attempts == 0 {
            anyhow::bail!("schedule.cycle_attempts must be at least 1");
        }

        if self.schedule.weather_interval_secs == 0 {
            anyhow::bail!("schedule.weather_interval_secs must be greater than 0");
        }

        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_string(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {key}: {v}"))
        })
        .transpose()
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value).with_context(|| format!("{name} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{name} must use http or https");
    }
    Ok(())
}

//! Chat webhook notifier
//!
//! Posts each event as `{"content": "<summary>"}`, the shape Discord-style
//! webhooks accept.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Notifier, NotifyError, StockEvent};
use crate::config::NotifyConfig;
use crate::utils::truncate_text;

/// Webhook message content limit
const MAX_CONTENT_CHARS: usize = 2000;

/// Webhook notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on 429/5xx
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Base delay of the exponential backoff
    #[serde(default = "default_backoff_ms")]
    pub backoff_base_ms: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            backoff_base_ms: default_backoff_ms(),
        }
    }

    /// Webhook settings from the notify section, if a URL is set
    pub fn from_notify_config(config: &NotifyConfig) -> Option<Self> {
        config.webhook_url.as_ref().map(|url| {
            Self::new(url.clone())
                .with_timeout(config.timeout_secs)
                .with_max_retries(config.max_retries)
        })
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook notifier
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    /// Create a new webhook notifier
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidConfig` if the configuration is invalid
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        config.validate().map_err(NotifyError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn from_url(url: impl Into<String>) -> Result<Self, NotifyError> {
        Self::new(WebhookConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_payload(&self, event: &StockEvent) -> serde_json::Value {
        serde_json::json!({
            "content": truncate_text(&event.summary(), MAX_CONTENT_CHARS),
        })
    }

    /// Send the request with retry logic
    async fn send_with_retry(&self, payload: &serde_json::Value) -> Result<(), NotifyError> {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.config.backoff_base_ms * 2_u64.pow(attempt - 1);
                tracing::debug!(
                    attempt = attempt + 1,
                    max_attempts = self.config.max_retries + 1,
                    "Retrying webhook request"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let result = match self.client.post(&self.config.url).json(payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(status = %response.status(), "Webhook delivered");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    NotifyError::Status { status, body }
                }
                Err(e) => NotifyError::Http(e),
            };

            if !result.is_retryable() || attempt >= self.config.max_retries {
                return Err(result);
            }

            attempt += 1;
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, event: &StockEvent) -> Result<(), NotifyError> {
        let payload = self.build_payload(event);
        self.send_with_retry(&payload).await.map_err(|e| {
            tracing::error!(event = event.kind(), error = %e, "Failed to deliver webhook");
            e
        })
    }
}

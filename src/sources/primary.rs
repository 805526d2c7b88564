//! Primary source: the scraped stock page

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::loader::{HttpPageLoader, PageLoader};
use super::StockSource;
use crate::config::Config;
use crate::models::{RawStock, SourceKind};
use crate::parser::StockPageParser;
use crate::utils::error::{FetchError, ParseError};
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Scrapes the primary stock page
///
/// Navigation is retried with exponential backoff (3 attempts, 2s then 4s
/// by default). A page that loads but lacks stock section markup counts as
/// a failed attempt.
pub struct PrimarySource {
    loader: Arc<dyn PageLoader>,
    parser: StockPageParser,
    url: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl PrimarySource {
    /// Create a source with default timeout and retry policy
    pub fn new(url: impl Into<String>, loader: Arc<dyn PageLoader>) -> Self {
        Self {
            loader,
            parser: StockPageParser::new(),
            url: url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Build from configuration with an HTTP loader
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let loader = Arc::new(HttpPageLoader::new()?);
        Ok(Self::new(config.sources.primary_url.clone(), loader)
            .with_timeout(config.timeouts.navigation())
            .with_retry(config.timeouts.navigation_retry()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One load attempt with the structural sanity check, no retries
    ///
    /// # Errors
    ///
    /// Propagates loader errors; `FetchError::MissingStockSections` when the
    /// page has no stock section markup.
    pub async fn load_page(&self, timeout: Duration) -> Result<String, FetchError> {
        let html = self.loader.load(&self.url, timeout).await?;
        if !StockPageParser::has_stock_markup(&html) {
            return Err(FetchError::MissingStockSections);
        }
        Ok(html)
    }

    /// Full fetch with retries, surfacing the failure
    ///
    /// # Errors
    ///
    /// Returns the last navigation error once attempts are exhausted, or
    /// `FetchError::MissingStockSections` if the final page has no sections.
    pub async fn try_fetch(&self) -> Result<RawStock, FetchError> {
        tracing::info!(url = %self.url, "Loading primary stock page");

        let html = with_retry_if(
            &self.retry,
            || self.load_page(self.timeout),
            FetchError::is_retryable,
        )
        .await?;

        self.parser.parse(&html).map_err(|e| match e {
            ParseError::NoStockSections | ParseError::MissingItemName => {
                FetchError::MissingStockSections
            }
        })
    }
}

#[async_trait]
impl StockSource for PrimarySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Primary
    }

    async fn fetch(&self) -> RawStock {
        match self.try_fetch().await {
            Ok(stock) => {
                tracing::info!(items = stock.total_items(), "Primary fetch complete");
                stock
            }
            Err(e) => {
                tracing::error!(error = %e, "Primary fetch failed, returning empty stock");
                RawStock::empty()
            }
        }
    }
}

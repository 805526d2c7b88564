//! Error types for stock acquisition
//!
//! This module defines the error types raised while loading and parsing
//! source data. None of them escape a snapshot cycle: sources convert them
//! into empty or partial stock.

use thiserror::Error;

/// Errors that can occur while fetching from a source
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Page loaded but carries no stock section markup
    #[error("Page content doesn't contain stock sections")]
    MissingStockSections,

    /// Response body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    ///
    /// Statuses retry on 429 and the transient 5xx family (500, 502, 503, 504).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::MissingStockSections => true,
            Self::ServerError(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Decode(_) => false,
        }
    }
}

/// Errors that can occur during parsing operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Document has no recognizable stock section
    #[error("No stock sections found in document")]
    NoStockSections,

    /// Stock item without a name element
    #[error("Stock item has no name")]
    MissingItemName,
}

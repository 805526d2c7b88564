//! Stock data sources
//!
//! - [`PrimarySource`]: scraped HTML stock page, the preferred source
//! - [`SecondarySource`]: JSON stock API used while failed over
//!
//! A source never fails a cycle. Total failure surfaces as
//! [`RawStock::empty`], partial failure as partially filled stock.

pub mod loader;
pub mod primary;
pub mod secondary;

use async_trait::async_trait;

use crate::models::{RawStock, SourceKind};

pub use loader::{HttpPageLoader, PageLoader};
pub use primary::PrimarySource;
pub use secondary::{ApiEndpoints, SecondarySource};

/// A provider of raw stock
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Which source this is
    fn kind(&self) -> SourceKind;

    /// Fetch current stock; failures are logged and yield empty categories
    async fn fetch(&self) -> RawStock;
}

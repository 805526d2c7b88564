//! stockwatch - Grow a Garden shop stock tracker
//!
//! Acquires shop stock from a scraped stock page (primary) or a JSON stock
//! API (secondary), decides which source to trust, and keeps that decision
//! on disk across restarts.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Categories, raw items and normalized snapshots
//! - [`parser`] - HTML parsing of the stock page
//! - [`sources`] - Primary (scrape) and secondary (API) stock sources
//! - [`failover`] - Failover controller, persisted state and health probing
//! - [`pipeline`] - Normalization and the per-cycle snapshot pipeline
//! - [`storage`] - JSON state file
//! - [`scheduler`] - Stock, restoration and weather loops
//! - [`notify`] - Webhook and log notifiers
//! - [`utils`] - Retry helpers, fetch and parse error types, text utilities
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stockwatch::config::Config;
//! use stockwatch::failover::{FailoverController, PrimaryHealthProbe};
//! use stockwatch::pipeline::SnapshotPipeline;
//! use stockwatch::sources::{PrimarySource, SecondarySource};
//! use stockwatch::storage::StateStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let primary = Arc::new(PrimarySource::from_config(&config)?);
//!     let secondary = Arc::new(SecondarySource::from_config(&config)?);
//!     let probe = Arc::new(PrimaryHealthProbe::new(Arc::clone(&primary)));
//!     let controller = Arc::new(FailoverController::new(
//!         StateStore::new(&config.storage.state_path),
//!         probe,
//!         config.failover.clone(),
//!     ));
//!
//!     let pipeline = SnapshotPipeline::new(primary, secondary, controller);
//!     let snapshot = pipeline.fetch_all().await;
//!     println!("{:?}", snapshot.consumer_view());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod failover;
pub mod models;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::failover::{CycleOutcome, FailoverController, FailoverState, Transition};
    pub use crate::models::{Category, RawItem, RawStock, SourceKind, StockSnapshot};
    pub use crate::pipeline::{CycleReport, SnapshotPipeline};
    pub use crate::sources::{PrimarySource, SecondarySource, StockSource};
}

// Direct re-exports for convenience
pub use models::{Category, RawItem, RawStock, SourceKind, StockSnapshot};

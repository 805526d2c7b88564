//! Snapshot pipeline
//!
//! One acquisition cycle: ask the controller which source to read, fetch,
//! fall back to the secondary source for this cycle if the primary came back
//! empty, normalize, and hand the snapshot back to the controller.

pub mod normalize;

use serde::Serialize;
use std::sync::Arc;

use crate::failover::{CycleOutcome, FailoverController};
use crate::models::{SourceKind, StockSnapshot};
use crate::sources::StockSource;
use crate::utils::unix_now;

pub use normalize::{normalize, normalize_item, normalize_items};

/// Result of one evaluated cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub snapshot: StockSnapshot,

    /// Source the snapshot actually came from
    pub source: SourceKind,

    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// New data arrived or the source changed
    pub fn is_actionable(&self) -> bool {
        self.outcome.fresh || self.outcome.transition.is_some()
    }
}

/// Orchestrates sources and the failover controller
pub struct SnapshotPipeline {
    primary: Arc<dyn StockSource>,
    secondary: Arc<dyn StockSource>,
    controller: Arc<FailoverController>,
}

impl SnapshotPipeline {
    pub fn new(
        primary: Arc<dyn StockSource>,
        secondary: Arc<dyn StockSource>,
        controller: Arc<FailoverController>,
    ) -> Self {
        Self {
            primary,
            secondary,
            controller,
        }
    }

    pub fn controller(&self) -> &Arc<FailoverController> {
        &self.controller
    }

    /// Fetch and normalize one snapshot without evaluating it
    pub async fn fetch_all(&self) -> StockSnapshot {
        self.fetch_all_at(unix_now()).await.1
    }

    /// [`fetch_all`](Self::fetch_all) at an explicit time, with the source used
    pub async fn fetch_all_at(&self, now: i64) -> (SourceKind, StockSnapshot) {
        let mode = self.controller.mode().await;
        tracing::info!(source = %mode, "Fetching stock");

        match mode {
            SourceKind::Primary => {
                let snapshot = normalize(&self.primary.fetch().await, now);
                if !snapshot.is_empty() {
                    return (SourceKind::Primary, snapshot);
                }

                tracing::warn!("Primary returned no data, using secondary for this cycle");
                let snapshot = normalize(&self.secondary.fetch().await, now);
                (SourceKind::Secondary, snapshot)
            }
            SourceKind::Secondary => {
                let snapshot = normalize(&self.secondary.fetch().await, now);
                (SourceKind::Secondary, snapshot)
            }
        }
    }

    /// Fetch and let the controller evaluate the result
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(unix_now()).await
    }

    /// [`run_cycle`](Self::run_cycle) at an explicit time
    pub async fn run_cycle_at(&self, now: i64) -> CycleReport {
        let (source, snapshot) = self.fetch_all_at(now).await;
        let outcome = self.controller.observe_cycle_at(&snapshot, now).await;

        tracing::info!(
            source = %source,
            items = snapshot.total_items(),
            fresh = outcome.fresh,
            repeated = outcome.repeated_count,
            "Cycle complete"
        );

        CycleReport {
            snapshot,
            source,
            outcome,
        }
    }
}

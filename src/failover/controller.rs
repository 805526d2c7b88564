//! Failover controller
//!
//! Two states, PRIMARY and FALLBACK. Every mutation of [`FailoverState`]
//! happens under one async mutex and is persisted before the lock is
//! released. Each lock re-reads the state file first, so a change written by
//! another process (the `switch` command against a running daemon) is
//! adopted before the next decision.
//!
//! - PRIMARY to FALLBACK: seeds repeated for `probe_after_repeats` cycles
//!   and the health probe fails, or repeated for `force_after_repeats`
//!   cycles regardless of the probe.
//! - FALLBACK to PRIMARY: only after `min_dwell_secs` in fallback, and only
//!   when the probe reports the primary reachable with fresh seeds.

use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use super::health::PrimaryProbe;
use super::state::FailoverState;
use crate::config::FailoverConfig;
use crate::models::{SourceKind, StockSnapshot};
use crate::storage::StateStore;
use crate::utils::unix_now;

// ============================================================================
// Transitions
// ============================================================================

/// Why the source changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Seeds repeated and the primary probe failed
    RepeatedDataProbeFailed,
    /// Seeds repeated past the hard ceiling
    RepeatedDataCeiling,
    /// Primary probe succeeded after the dwell time
    Restored,
    /// Operator switch
    ManualOverride,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepeatedDataProbeFailed => "repeated data, primary probe failed",
            Self::RepeatedDataCeiling => "repeated data ceiling reached",
            Self::Restored => "primary restored with fresh data",
            Self::ManualOverride => "manual override",
        }
    }
}

/// A change of source that actually happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: SourceKind,
    pub to: SourceKind,
    pub reason: TransitionReason,
    /// Unix time of the change
    pub at: i64,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.reason.as_str())?;
        if let Some(at) = Utc.timestamp_opt(self.at, 0).single() {
            write!(f, " at {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

/// Result of evaluating one acquisition cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    /// Seeds differ from the cached snapshot
    pub fresh: bool,

    /// Repeat counter after this cycle
    pub repeated_count: u32,

    /// Set only when the mode changed during this call
    pub transition: Option<Transition>,
}

// ============================================================================
// Controller
// ============================================================================

/// In-memory state plus the last copy exchanged with the state file
struct Synced {
    state: FailoverState,
    on_disk: Option<FailoverState>,
}

/// Owner of the failover decision
pub struct FailoverController {
    inner: Mutex<Synced>,
    store: StateStore,
    probe: Arc<dyn PrimaryProbe>,
    config: FailoverConfig,
}

impl FailoverController {
    /// Create a controller, restoring state from `store`
    pub fn new(store: StateStore, probe: Arc<dyn PrimaryProbe>, config: FailoverConfig) -> Self {
        let state: FailoverState = store.load_or_default();
        tracing::info!(
            mode = %state.mode(),
            repeated = state.repeated_data_count,
            "Failover state restored"
        );
        Self::with_state(state, store, probe, config)
    }

    /// Create a controller with explicit initial state
    pub fn with_state(
        state: FailoverState,
        store: StateStore,
        probe: Arc<dyn PrimaryProbe>,
        config: FailoverConfig,
    ) -> Self {
        let on_disk = store.load().ok().flatten();
        Self {
            inner: Mutex::new(Synced { state, on_disk }),
            store,
            probe,
            config,
        }
    }

    /// Whether the pipeline should read from the secondary source
    pub async fn should_use_fallback(&self) -> bool {
        self.lock_synced().await.state.using_fallback
    }

    pub async fn mode(&self) -> SourceKind {
        self.lock_synced().await.state.mode()
    }

    /// Copy of the current state
    pub async fn snapshot_state(&self) -> FailoverState {
        self.lock_synced().await.state.clone()
    }

    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Evaluate a completed cycle against the cache
    pub async fn observe_cycle(&self, snapshot: &StockSnapshot) -> CycleOutcome {
        self.observe_cycle_at(snapshot, unix_now()).await
    }

    /// [`observe_cycle`](Self::observe_cycle) at an explicit time
    pub async fn observe_cycle_at(&self, snapshot: &StockSnapshot, now: i64) -> CycleOutcome {
        let mut guard = self.lock_synced().await;
        let Synced { state, on_disk } = &mut *guard;

        // Total failure says nothing about staleness
        if snapshot.is_empty() {
            tracing::warn!("Empty snapshot, repeat counter unchanged");
            return CycleOutcome {
                fresh: false,
                repeated_count: state.repeated_data_count,
                transition: None,
            };
        }

        let before = state.clone();
        let fresh = state
            .last_data
            .as_ref()
            .map_or(true, |last| !last.same_seeds(snapshot));

        if fresh {
            state.repeated_data_count = 0;
            state.last_data = Some(snapshot.clone());
            tracing::info!(seeds = snapshot.seeds().len(), "New stock data");
        } else {
            state.repeated_data_count += 1;
            tracing::warn!(
                repeated = state.repeated_data_count,
                "Seeds identical to previous cycle"
            );
        }

        let mut transition = None;
        if !state.using_fallback {
            let count = state.repeated_data_count;

            if count >= self.config.force_after_repeats {
                tracing::error!(repeated = count, "Repeat ceiling reached, forcing fallback");
                transition = Some(Self::enter_fallback(
                    state,
                    TransitionReason::RepeatedDataCeiling,
                    now,
                ));
            } else if count >= self.config.probe_after_repeats {
                tracing::warn!(repeated = count, "Probing primary source");
                if !self.probe.probe_primary(state.last_seeds()).await {
                    transition = Some(Self::enter_fallback(
                        state,
                        TransitionReason::RepeatedDataProbeFailed,
                        now,
                    ));
                }
            }
        }

        if *state != before {
            self.persist(state, on_disk);
        }

        CycleOutcome {
            fresh,
            repeated_count: state.repeated_data_count,
            transition,
        }
    }

    /// Attempt FALLBACK to PRIMARY
    pub async fn try_restore(&self) -> Option<Transition> {
        self.try_restore_at(unix_now()).await
    }

    /// [`try_restore`](Self::try_restore) at an explicit time
    pub async fn try_restore_at(&self, now: i64) -> Option<Transition> {
        let mut guard = self.lock_synced().await;
        let Synced { state, on_disk } = &mut *guard;

        if !state.using_fallback {
            return None;
        }

        if let Some(elapsed) = state.fallback_elapsed(now) {
            if elapsed < self.config.min_dwell_secs {
                tracing::debug!(
                    elapsed_secs = elapsed,
                    dwell_secs = self.config.min_dwell_secs,
                    "Restoration check skipped, dwell time not reached"
                );
                return None;
            }
        }

        if !self.probe.probe_primary(state.last_seeds()).await {
            tracing::info!("Primary still unhealthy, staying on fallback");
            return None;
        }

        state.using_fallback = false;
        state.switch_time = None;
        state.repeated_data_count = 0;
        self.persist(state, on_disk);

        let transition = Transition {
            from: SourceKind::Secondary,
            to: SourceKind::Primary,
            reason: TransitionReason::Restored,
            at: now,
        };
        tracing::info!(%transition, "Switched back to primary source");
        Some(transition)
    }

    /// Operator override of the current source
    pub async fn force_source(&self, target: SourceKind) -> Option<Transition> {
        self.force_source_at(target, unix_now()).await
    }

    /// [`force_source`](Self::force_source) at an explicit time
    pub async fn force_source_at(&self, target: SourceKind, now: i64) -> Option<Transition> {
        let mut guard = self.lock_synced().await;
        let Synced { state, on_disk } = &mut *guard;
        let before = state.clone();
        let from = state.mode();

        state.repeated_data_count = 0;
        match target {
            SourceKind::Secondary => {
                state.using_fallback = true;
                if from != target || state.switch_time.is_none() {
                    state.switch_time = Some(now);
                }
            }
            SourceKind::Primary => {
                state.using_fallback = false;
                state.switch_time = None;
            }
        }

        if *state != before {
            self.persist(state, on_disk);
        }

        if from == target {
            tracing::info!(source = %target, "Manual switch: already on requested source");
            return None;
        }

        let transition = Transition {
            from,
            to: target,
            reason: TransitionReason::ManualOverride,
            at: now,
        };
        tracing::info!(%transition, "Manual source switch");
        Some(transition)
    }

    /// Record a weather value; true when it differs from the last alert
    pub async fn record_weather_alert(&self, weather: &str) -> bool {
        let value = weather.trim().to_lowercase();
        let mut guard = self.lock_synced().await;
        let Synced { state, on_disk } = &mut *guard;

        if state.last_weather_alert.as_deref() == Some(value.as_str()) {
            return false;
        }

        state.last_weather_alert = Some(value);
        self.persist(state, on_disk);
        true
    }

    /// Time left before restoration may be considered
    pub async fn dwell_remaining(&self) -> Option<Duration> {
        self.dwell_remaining_at(unix_now()).await
    }

    /// [`dwell_remaining`](Self::dwell_remaining) at an explicit time
    pub async fn dwell_remaining_at(&self, now: i64) -> Option<Duration> {
        let guard = self.lock_synced().await;
        let state = &guard.state;
        if !state.using_fallback {
            return None;
        }

        let elapsed = state.fallback_elapsed(now).unwrap_or(self.config.min_dwell_secs);
        let remaining = (self.config.min_dwell_secs - elapsed).max(0);
        Some(Duration::from_secs(remaining as u64))
    }

    fn enter_fallback(state: &mut FailoverState, reason: TransitionReason, now: i64) -> Transition {
        state.using_fallback = true;
        state.switch_time = Some(now);

        let transition = Transition {
            from: SourceKind::Primary,
            to: SourceKind::Secondary,
            reason,
            at: now,
        };
        tracing::warn!(%transition, "Switched to fallback source");
        transition
    }

    /// Lock the state, first adopting any change another writer made to
    /// the state file since this controller last read or wrote it
    ///
    /// A missing or unreadable file leaves the in-memory state in charge;
    /// the next persist rewrites it.
    async fn lock_synced(&self) -> MutexGuard<'_, Synced> {
        let mut guard = self.inner.lock().await;

        match self.store.load::<FailoverState>() {
            Ok(Some(disk)) if guard.on_disk.as_ref() != Some(&disk) => {
                if disk != guard.state {
                    tracing::info!(
                        mode = %disk.mode(),
                        path = %self.store.path().display(),
                        "State file changed externally, reloading"
                    );
                    guard.state = disk.clone();
                }
                guard.on_disk = Some(disk);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "State file unreadable, keeping in-memory state");
            }
        }

        guard
    }

    /// Best-effort write; the in-memory state stays authoritative
    fn persist(&self, state: &FailoverState, on_disk: &mut Option<FailoverState>) {
        match self.store.save(state) {
            Ok(()) => *on_disk = Some(state.clone()),
            Err(e) => {
                tracing::error!(error = %e, path = %self.store.path().display(), "Failed to persist failover state");
            }
        }
    }
}

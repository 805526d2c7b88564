//! Source failover
//!
//! Decides whether stock is read from the primary page or the secondary
//! API, probes the primary for restoration, and keeps the decision state
//! on disk across restarts.

pub mod controller;
pub mod health;
pub mod state;

pub use controller::{CycleOutcome, FailoverController, Transition, TransitionReason};
pub use health::{HealthReport, HealthStatus, PrimaryHealthProbe, PrimaryProbe};
pub use state::FailoverState;

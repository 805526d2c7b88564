//! Primary-source health probing
//!
//! A primary source counts as healthy only when it is reachable AND serving
//! seeds that differ from the last cached snapshot. A reachable page that
//! repeats old data is reported unhealthy.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use super::state::FailoverState;
use crate::pipeline::normalize;
use crate::sources::{PrimarySource, SecondarySource};
use crate::utils::unix_now;

// ============================================================================
// Probe
// ============================================================================

/// Verifies that the primary source is reachable and fresh
#[async_trait]
pub trait PrimaryProbe: Send + Sync {
    /// True only if the primary serves seeds different from `last_seeds`.
    /// Never fails; every error reads as `false`.
    async fn probe_primary(&self, last_seeds: Option<&[String]>) -> bool;
}

/// Probe backed by the real primary source
pub struct PrimaryHealthProbe {
    source: Arc<PrimarySource>,
    timeout: Duration,
}

impl PrimaryHealthProbe {
    pub fn new(source: Arc<PrimarySource>) -> Self {
        Self {
            source,
            timeout: Duration::from_secs(5),
        }
    }

    /// Timeout of the cheap raw-document check
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PrimaryProbe for PrimaryHealthProbe {
    async fn probe_primary(&self, last_seeds: Option<&[String]>) -> bool {
        // Cheap rejection before a full fetch
        if let Err(e) = self.source.load_page(self.timeout).await {
            tracing::info!(error = %e, "Primary probe: page unavailable");
            return false;
        }

        let stock = match self.source.try_fetch().await {
            Ok(stock) => stock,
            Err(e) => {
                tracing::info!(error = %e, "Primary probe: fetch failed");
                return false;
            }
        };

        let snapshot = normalize(&stock, unix_now());
        if snapshot.seeds().is_empty() {
            tracing::info!("Primary probe: no seeds returned");
            return false;
        }

        let fresh = match last_seeds {
            Some(last) => {
                let last: BTreeSet<&str> = last.iter().map(String::as_str).collect();
                snapshot.seed_set() != last
            }
            None => true,
        };

        if fresh {
            tracing::info!(seeds = snapshot.seeds().len(), "Primary probe: fresh data");
        } else {
            tracing::info!("Primary probe: data identical to cache");
        }
        fresh
    }
}

// ============================================================================
// Health Report
// ============================================================================

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Point-in-time health of both sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Reachability of each secondary endpoint
    pub endpoints: BTreeMap<String, bool>,

    /// Primary reachable and fresh
    pub primary: bool,

    /// Current failover mode
    pub using_fallback: bool,
}

impl HealthReport {
    /// Probe everything concurrently
    pub async fn collect(
        secondary: &SecondarySource,
        probe: &dyn PrimaryProbe,
        state: &FailoverState,
    ) -> Self {
        let (endpoints, primary) = futures::join!(
            secondary.check_health(),
            probe.probe_primary(state.last_seeds())
        );

        Self {
            endpoints,
            primary,
            using_fallback: state.using_fallback,
        }
    }

    pub fn status(&self) -> HealthStatus {
        let endpoints_up = self.endpoints.values().filter(|up| **up).count();
        let all_endpoints = endpoints_up == self.endpoints.len();

        if self.primary && all_endpoints {
            HealthStatus::Healthy
        } else if self.primary || endpoints_up > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(primary: bool, endpoints: &[(&str, bool)]) -> HealthReport {
        HealthReport {
            endpoints: endpoints
                .iter()
                .map(|(name, up)| (name.to_string(), *up))
                .collect(),
            primary,
            using_fallback: false,
        }
    }

    #[test]
    fn test_status_healthy() {
        let r = report(true, &[("gear_seeds", true), ("egg", true), ("honey", true)]);
        assert_eq!(r.status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_status_degraded() {
        let r = report(false, &[("gear_seeds", true), ("egg", false), ("honey", true)]);
        assert_eq!(r.status(), HealthStatus::Degraded);

        let r = report(true, &[("gear_seeds", false), ("egg", false), ("honey", false)]);
        assert_eq!(r.status(), HealthStatus::Degraded);
    }

    #[test]
    fn test_status_unhealthy() {
        let r = report(false, &[("gear_seeds", false), ("egg", false), ("honey", false)]);
        assert_eq!(r.status(), HealthStatus::Unhealthy);
        assert_eq!(r.status().as_str(), "unhealthy");
    }

    #[test]
    fn test_report_serializes() {
        let r = report(true, &[("egg", true)]);
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["endpoints"]["egg"], true);
        assert_eq!(value["primary"], true);
    }
}

//! Persisted failover state

use serde::{Deserialize, Serialize};

use crate::models::{SourceKind, StockSnapshot};

/// Decision state of the failover controller
///
/// Serializes to the on-disk cache document:
///
/// ```json
/// {
///   "last_data": { "categories": { "seeds": ["Carrot (x5)"] }, "fetched_at": 1718000000 },
///   "repeated_data_count": 0,
///   "is_website_broken": false,
///   "last_weather_alert": null,
///   "fallback_switch_time": null
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailoverState {
    /// Last snapshot with new seeds
    pub last_data: Option<StockSnapshot>,

    /// Consecutive cycles whose seeds matched `last_data`
    pub repeated_data_count: u32,

    /// Whether the secondary source is in use
    #[serde(rename = "is_website_broken")]
    pub using_fallback: bool,

    /// Lower-cased weather value last alerted on
    pub last_weather_alert: Option<String>,

    /// Unix time fallback was activated
    #[serde(rename = "fallback_switch_time")]
    pub switch_time: Option<i64>,
}

impl FailoverState {
    /// Source the pipeline should read from
    pub fn mode(&self) -> SourceKind {
        if self.using_fallback {
            SourceKind::Secondary
        } else {
            SourceKind::Primary
        }
    }

    /// Seconds spent in fallback as of `now`
    pub fn fallback_elapsed(&self, now: i64) -> Option<i64> {
        if !self.using_fallback {
            return None;
        }
        self.switch_time.map(|since| (now - since).max(0))
    }

    pub fn last_seeds(&self) -> Option<&[String]> {
        self.last_data.as_ref().map(StockSnapshot::seeds)
    }
}

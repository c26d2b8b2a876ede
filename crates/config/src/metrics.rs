//! `[metrics]` section
//!
//! Periodic write-path reports: per-destination queue depth, wait and
//! processing times, and request, error and drop counters.

use serde::Deserialize;
use std::time::Duration;

/// Default period between reports
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(60);

/// Report rendering
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// One `[writer:<destination>]` line per destination
    #[default]
    Human,
    /// One JSON object per report
    Json,
}

/// `[metrics]` section
///
/// ```toml
/// [metrics]
/// interval = "30s"
/// format = "json"
/// final_report = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Turn periodic reports on or off
    pub enabled: bool,

    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    pub format: MetricsFormat,

    /// Emit one last report when the reporter is stopped, so short runs
    /// that end before the first interval still show their totals
    pub final_report: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_METRICS_INTERVAL,
            format: MetricsFormat::Human,
            final_report: true,
        }
    }
}

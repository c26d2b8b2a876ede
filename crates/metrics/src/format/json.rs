//! JSON metrics formatter
//!
//! Formats metrics as structured JSON for machine parsing.
//!
//! # Example Output
//!
//! ```json
//! {"type":"writer","interval_secs":60,"destinations":[{"destination":"traces", ...}]}
//! ```

use serde::Serialize;

use super::MetricsFormatter;
use crate::{CoalescerSnapshot, DestinationSnapshot};

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    interval_secs: u64,
    destinations: &'a [DestinationSnapshot],
}

impl MetricsFormatter for JsonFormatter {
    fn format(&self, snapshot: &CoalescerSnapshot, interval_secs: u64) -> String {
        let report = ReportJson {
            report_type: "writer",
            interval_secs,
            destinations: &snapshot.destinations,
        };
        serde_json::to_string(&report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

//! Human-readable metrics formatter
//!
//! # Example Output
//!
//! ```text
//! [writer:traces] period: 60s | depth: 12 | written: 1.2K | requests: 3 | errors: 0 | dropped: 0 | wait: 4.1ms avg | flush: 2.0ms avg
//! ```

use std::fmt::Write;

use super::{MetricsFormatter, format_count, format_duration};
use crate::CoalescerSnapshot;

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format(&self, snapshot: &CoalescerSnapshot, interval_secs: u64) -> String {
        if snapshot.destinations.is_empty() {
            return format!("[writer] period: {}s | no activity", interval_secs);
        }

        let mut output = String::new();
        for (i, d) in snapshot.destinations.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }

            let _ = write!(
                output,
                "[writer:{}] period: {}s | depth: {} | written: {} | requests: {} | errors: {} | dropped: {} | wait: {} avg | flush: {} avg",
                d.destination,
                interval_secs,
                d.queue_depth,
                format_count(d.records_written),
                format_count(d.requests),
                d.write_errors,
                d.dropped,
                format_duration(d.wait_time.mean()),
                format_duration(d.processing_time.mean()),
            );

            if d.splits > 0 || d.truncations > 0 {
                let _ = write!(output, " | splits: {} | truncated: {}", d.splits, d.truncations);
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DestinationSnapshot;

    #[test]
    fn test_format_empty() {
        let output = HumanFormatter::new().format(&CoalescerSnapshot::default(), 60);
        assert!(output.contains("no activity"));
    }

    #[test]
    fn test_format_destination() {
        let snapshot = CoalescerSnapshot {
            destinations: vec![DestinationSnapshot {
                destination: "traces".into(),
                queue_depth: 12,
                records_written: 1200,
                requests: 3,
                splits: 1,
                ..Default::default()
            }],
        };

        let output = HumanFormatter::new().format(&snapshot, 60);
        assert!(output.starts_with("[writer:traces] period: 60s"));
        assert!(output.contains("depth: 12"));
        assert!(output.contains("written: 1.2K"));
        assert!(output.contains("splits: 1"));
    }
}

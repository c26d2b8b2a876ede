//! Metrics sink trait
//!
//! The write path reports through `MetricsSink` without knowing the concrete
//! collector. Destinations are identified by their tag (`"traces"`, ...).

use std::time::Duration;

/// Receiver of write-path measurements
///
/// Implementations must be cheap and non-blocking: they are called from inside
/// flush cycles, once per item for wait times.
pub trait MetricsSink: Send + Sync {
    /// Current queue length for a destination (gauge)
    fn queue_depth(&self, destination: &str, depth: usize);

    /// Time an item spent queued before its flush started (histogram)
    fn wait_time(&self, destination: &str, wait: Duration);

    /// Duration of a successful store write and the records it carried
    fn processing_time(&self, destination: &str, elapsed: Duration, records: usize);

    /// One store call issued (counter)
    fn request(&self, destination: &str);

    /// One store call failed (counter)
    fn write_error(&self, destination: &str);

    /// A batch was split after a string-size failure
    fn split(&self, destination: &str);

    /// Truncation was applied to `records` records
    fn truncated(&self, destination: &str, records: usize);

    /// Items returned to the back of the queue after a failed cycle
    fn requeued(&self, destination: &str, count: usize);

    /// Items permanently discarded after exhausting their attempts
    fn dropped(&self, destination: &str, count: usize);
}

/// Metrics sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn queue_depth(&self, _destination: &str, _depth: usize) {}
    fn wait_time(&self, _destination: &str, _wait: Duration) {}
    fn processing_time(&self, _destination: &str, _elapsed: Duration, _records: usize) {}
    fn request(&self, _destination: &str) {}
    fn write_error(&self, _destination: &str) {}
    fn split(&self, _destination: &str) {}
    fn truncated(&self, _destination: &str, _records: usize) {}
    fn requeued(&self, _destination: &str, _count: usize) {}
    fn dropped(&self, _destination: &str, _count: usize) {}
}

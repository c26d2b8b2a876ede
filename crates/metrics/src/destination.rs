//! Per-destination write metrics
//!
//! Atomic counters and histograms for tracking coalescer health.
//! Each destination gets its own `DestinationMetrics`, created on first use.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use crate::MetricsSink;

// =============================================================================
// Histogram
// =============================================================================

/// Lock-free duration summary (count, sum, max)
#[derive(Debug, Default)]
pub struct Histogram {
    count: AtomicU64,
    sum_ns: AtomicU64,
    max_ns: AtomicU64,
}

impl Histogram {
    /// Create an empty histogram
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_ns: AtomicU64::new(0),
            max_ns: AtomicU64::new(0),
        }
    }

    /// Record one observation
    #[inline]
    pub fn record(&self, value: Duration) {
        let ns = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_ns.fetch_add(ns, Ordering::Relaxed);
        self.max_ns.fetch_max(ns, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            count: self.count.load(Ordering::Relaxed),
            sum_ns: self.sum_ns.load(Ordering::Relaxed),
            max_ns: self.max_ns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of a histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum_ns: u64,
    pub max_ns: u64,
}

impl HistogramSnapshot {
    /// Mean observation
    #[inline]
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.sum_ns / self.count)
        }
    }

    /// Largest observation
    #[inline]
    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_ns)
    }
}

// =============================================================================
// Destination Metrics
// =============================================================================

/// Metrics for a single destination
#[derive(Debug, Default)]
pub struct DestinationMetrics {
    /// Last reported queue length
    pub queue_depth: AtomicU64,
    /// Enqueue-to-flush-start wait time
    pub wait_time: Histogram,
    /// Duration of successful store writes
    pub processing_time: Histogram,
    /// Store calls issued
    pub requests: AtomicU64,
    /// Records acknowledged by the store
    pub records_written: AtomicU64,
    /// Failed store calls
    pub write_errors: AtomicU64,
    /// Batch splits after string-size failures
    pub splits: AtomicU64,
    /// Records truncated
    pub truncations: AtomicU64,
    /// Records requeued after a failed cycle
    pub requeued: AtomicU64,
    /// Records dropped after exhausting attempts
    pub dropped: AtomicU64,
}

impl DestinationMetrics {
    /// Take a snapshot of current values
    pub fn snapshot(&self, destination: &str) -> DestinationSnapshot {
        DestinationSnapshot {
            destination: destination.to_string(),
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            wait_time: self.wait_time.snapshot(),
            processing_time: self.processing_time.snapshot(),
            requests: self.requests.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            splits: self.splits.load(Ordering::Relaxed),
            truncations: self.truncations.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of one destination's metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DestinationSnapshot {
    pub destination: String,
    pub queue_depth: u64,
    pub wait_time: HistogramSnapshot,
    pub processing_time: HistogramSnapshot,
    pub requests: u64,
    pub records_written: u64,
    pub write_errors: u64,
    pub splits: u64,
    pub truncations: u64,
    pub requeued: u64,
    pub dropped: u64,
}

// =============================================================================
// Coalescer Metrics
// =============================================================================

/// Default `MetricsSink`: per-destination atomics behind a name-keyed map
///
/// The map lock is only taken for writing the first time a destination is
/// seen; every later update is a read lock plus relaxed atomics.
#[derive(Debug, Default)]
pub struct CoalescerMetrics {
    destinations: RwLock<BTreeMap<String, Arc<DestinationMetrics>>>,
}

impl CoalescerMetrics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics for one destination, created on first use
    pub fn destination(&self, destination: &str) -> Arc<DestinationMetrics> {
        if let Some(metrics) = self.destinations.read().get(destination) {
            return Arc::clone(metrics);
        }

        let mut destinations = self.destinations.write();
        Arc::clone(
            destinations
                .entry(destination.to_string())
                .or_insert_with(|| Arc::new(DestinationMetrics::default())),
        )
    }

    /// Snapshot of every destination seen so far, ordered by name
    pub fn snapshot(&self) -> CoalescerSnapshot {
        let destinations = self
            .destinations
            .read()
            .iter()
            .map(|(name, metrics)| metrics.snapshot(name))
            .collect();

        CoalescerSnapshot { destinations }
    }
}

impl MetricsSink for CoalescerMetrics {
    fn queue_depth(&self, destination: &str, depth: usize) {
        self.destination(destination)
            .queue_depth
            .store(depth as u64, Ordering::Relaxed);
    }

    fn wait_time(&self, destination: &str, wait: Duration) {
        self.destination(destination).wait_time.record(wait);
    }

    fn processing_time(&self, destination: &str, elapsed: Duration, records: usize) {
        let metrics = self.destination(destination);
        metrics.processing_time.record(elapsed);
        metrics
            .records_written
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    fn request(&self, destination: &str) {
        self.destination(destination)
            .requests
            .fetch_add(1, Ordering::Relaxed);
    }

    fn write_error(&self, destination: &str) {
        self.destination(destination)
            .write_errors
            .fetch_add(1, Ordering::Relaxed);
    }

    fn split(&self, destination: &str) {
        self.destination(destination)
            .splits
            .fetch_add(1, Ordering::Relaxed);
    }

    fn truncated(&self, destination: &str, records: usize) {
        self.destination(destination)
            .truncations
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    fn requeued(&self, destination: &str, count: usize) {
        self.destination(destination)
            .requeued
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    fn dropped(&self, destination: &str, count: usize) {
        self.destination(destination)
            .dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of all destinations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoalescerSnapshot {
    pub destinations: Vec<DestinationSnapshot>,
}

impl CoalescerSnapshot {
    /// Snapshot for one destination, if it has reported anything
    pub fn get(&self, destination: &str) -> Option<&DestinationSnapshot> {
        self.destinations
            .iter()
            .find(|d| d.destination == destination)
    }

    /// Records written across all destinations
    pub fn total_written(&self) -> u64 {
        self.destinations.iter().map(|d| d.records_written).sum()
    }

    /// Records dropped across all destinations
    pub fn total_dropped(&self) -> u64 {
        self.destinations.iter().map(|d| d.dropped).sum()
    }

    /// Failed store calls across all destinations
    pub fn total_errors(&self) -> u64 {
        self.destinations.iter().map(|d| d.write_errors).sum()
    }
}

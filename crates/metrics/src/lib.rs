//! Spool - Metrics
//!
//! Write-path metrics for the coalescer.
//!
//! # Overview
//!
//! This crate provides:
//! - The `MetricsSink` trait the write path reports through
//! - `CoalescerMetrics`, a lock-free per-destination implementation
//! - A periodic reporter with human or JSON output
//!
//! # Metric Categories
//!
//! - **Gauges**: queue depth per destination
//! - **Histograms**: enqueue-to-flush wait time, store write time
//! - **Counters**: requests, records written, write errors, splits,
//!   truncations, requeued, dropped
//!
//! # Example
//!
//! ```ignore
//! use spool_metrics::{CoalescerMetrics, MetricsSink, spawn_reporter};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(CoalescerMetrics::new());
//! let sink: Arc<dyn MetricsSink> = metrics.clone();
//! spawn_reporter(metrics, &config.metrics, cancel.clone());
//! ```

mod destination;
pub mod format;
mod reporter;
mod sink;

pub use destination::{
    CoalescerMetrics, CoalescerSnapshot, DestinationMetrics, DestinationSnapshot, Histogram,
    HistogramSnapshot,
};
pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use reporter::{MetricsReporter, spawn_reporter};
pub use sink::{MetricsSink, NoopMetrics};

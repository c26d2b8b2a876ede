//! Periodic metrics reporter
//!
//! Logs a coalescer snapshot at the configured interval until cancelled,
//! plus an optional last snapshot on the way out.

use std::sync::Arc;

use spool_config::{MetricsConfig, MetricsFormat};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::format::MetricsFormatter;
use crate::{CoalescerMetrics, HumanFormatter, JsonFormatter};

/// Periodic reporter for `CoalescerMetrics`
pub struct MetricsReporter {
    metrics: Arc<CoalescerMetrics>,
    formatter: Box<dyn MetricsFormatter>,
    interval: Duration,
    final_report: bool,
}

impl MetricsReporter {
    /// Create a new reporter
    pub fn new(metrics: Arc<CoalescerMetrics>, format: MetricsFormat, interval: Duration) -> Self {
        let formatter: Box<dyn MetricsFormatter> = match format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };

        Self {
            metrics,
            formatter,
            interval,
            final_report: false,
        }
    }

    /// Log one more snapshot after cancellation
    pub fn with_final_report(mut self, enabled: bool) -> Self {
        self.final_report = enabled;
        self
    }

    /// Run the reporter until cancellation
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "metrics reporter started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    info!("{}", self.render());
                }
            }
        }

        if self.final_report {
            info!(final_report = true, "{}", self.render());
        }
    }

    /// Format the current snapshot
    pub fn render(&self) -> String {
        self.formatter
            .format(&self.metrics.snapshot(), self.interval.as_secs())
    }
}

/// Spawn the reporter if metrics are enabled
pub fn spawn_reporter(
    metrics: Arc<CoalescerMetrics>,
    config: &MetricsConfig,
    cancel: CancellationToken,
) -> Option<tokio::task::JoinHandle<()>> {
    if !config.enabled {
        return None;
    }

    let reporter = MetricsReporter::new(metrics, config.format, config.interval)
        .with_final_report(config.final_report);
    Some(tokio::spawn(reporter.run(cancel)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsSink;

    #[test]
    fn test_render_human() {
        let metrics = Arc::new(CoalescerMetrics::new());
        metrics.request("traces");

        let reporter =
            MetricsReporter::new(Arc::clone(&metrics), MetricsFormat::Human, Duration::from_secs(30));
        let output = reporter.render();
        assert!(output.contains("[writer:traces]"));
        assert!(output.contains("period: 30s"));
    }

    #[test]
    fn test_render_json() {
        let metrics = Arc::new(CoalescerMetrics::new());
        metrics.dropped("scores", 3);

        let reporter = MetricsReporter::new(metrics, MetricsFormat::Json, Duration::from_secs(5));
        assert!(reporter.render().contains("\"dropped\":3"));
    }

    #[tokio::test]
    async fn test_spawn_disabled() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        let handle = spawn_reporter(
            Arc::new(CoalescerMetrics::new()),
            &config,
            CancellationToken::new(),
        );
        assert!(handle.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancellation() {
        let config = MetricsConfig {
            interval: Duration::from_millis(100),
            ..Default::default()
        };
        let cancel = CancellationToken::new();
        let handle = spawn_reporter(Arc::new(CoalescerMetrics::new()), &config, cancel.clone())
            .unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;
        cancel.cancel();

        // Should exit when cancelled
        handle.await.unwrap();
    }

    #[test]
    fn test_final_report_off_by_default() {
        let reporter = MetricsReporter::new(
            Arc::new(CoalescerMetrics::new()),
            MetricsFormat::Human,
            Duration::from_secs(1),
        );
        assert!(!reporter.final_report);
        assert!(reporter.with_final_report(true).final_report);
    }
}

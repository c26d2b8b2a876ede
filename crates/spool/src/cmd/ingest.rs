//! `spool ingest`
//!
//! Streams envelopes into the coalescer until EOF or Ctrl-C, then shuts the
//! coalescer down so every buffered record is drained.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use spool_coalescer::{Coalescer, ShutdownReport, build_store};
use spool_config::Config;
use spool_metrics::{CoalescerMetrics, MetricsSink, spawn_reporter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::envelope::parse_line;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// NDJSON file to read (stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Line counts for one ingest run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    pub enqueued: u64,
    pub invalid: u64,
}

pub async fn run(config: Config, args: IngestArgs) -> Result<()> {
    let metrics = Arc::new(CoalescerMetrics::new());
    let store = build_store(&config.store).context("failed to build backing store")?;
    let coalescer = Coalescer::new(
        config.writer.clone(),
        store,
        Arc::clone(&metrics) as Arc<dyn MetricsSink>,
    )?;
    coalescer.start()?;

    let cancel = CancellationToken::new();
    let reporter = spawn_reporter(Arc::clone(&metrics), &config.metrics, cancel.child_token());

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping ingest");
            interrupt.cancel();
        }
    });

    let stats = match args.input {
        Some(ref path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            ingest_lines(BufReader::new(file), &coalescer, &cancel).await?
        }
        None => ingest_lines(BufReader::new(tokio::io::stdin()), &coalescer, &cancel).await?,
    };

    tracing::info!(
        lines = stats.lines,
        enqueued = stats.enqueued,
        invalid = stats.invalid,
        "input finished"
    );

    let report = coalescer.shutdown().await;
    log_report(&report);

    cancel.cancel();
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        written = snapshot.total_written(),
        dropped = snapshot.total_dropped(),
        errors = snapshot.total_errors(),
        "ingest complete"
    );
    Ok(())
}

/// Enqueue every valid envelope until EOF or cancellation
pub async fn ingest_lines<R>(
    reader: R,
    coalescer: &Coalescer,
    cancel: &CancellationToken,
) -> Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = IngestStats::default();
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("failed to read input")?,
        };
        let Some(line) = line else { break };
        stats.lines += 1;

        match parse_line(&line) {
            Ok(Some((destination, record))) => {
                coalescer.enqueue(destination, record);
                stats.enqueued += 1;
            }
            Ok(None) => {}
            Err(e) => {
                stats.invalid += 1;
                tracing::warn!(line = stats.lines, error = %e, "skipping invalid envelope");
            }
        }
    }

    Ok(stats)
}

fn log_report(report: &ShutdownReport) {
    if report.dropped > 0 || report.remaining > 0 {
        tracing::warn!(
            pending = report.pending,
            written = report.written,
            dropped = report.dropped,
            remaining = report.remaining,
            "shutdown finished with undelivered records"
        );
    } else {
        tracing::info!(
            pending = report.pending,
            written = report.written,
            passes = report.passes,
            "shutdown drained all records"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_coalescer::{BackingStore, Destination, StdoutStore};
    use spool_config::WriterConfig;

    fn coalescer() -> Coalescer {
        Coalescer::builder(WriterConfig::default())
            .store(Arc::new(StdoutStore::new()) as Arc<dyn BackingStore>)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_counts_lines() {
        let input = concat!(
            r#"{"destination":"traces","record":{"id":"t-1"}}"#,
            "\n",
            "\n",
            "garbage\n",
            r#"{"destination":"scores","record":{"id":"s-1","value":0.5}}"#,
            "\n",
        );
        let coalescer = coalescer();
        let cancel = CancellationToken::new();

        let stats = ingest_lines(input.as_bytes(), &coalescer, &cancel)
            .await
            .unwrap();

        assert_eq!(
            stats,
            IngestStats {
                lines: 4,
                enqueued: 2,
                invalid: 1,
            }
        );
        assert_eq!(coalescer.pending_for(Destination::Traces), 1);
        assert_eq!(coalescer.pending_for(Destination::Scores), 1);
    }

    #[tokio::test]
    async fn test_ingest_stops_on_cancel() {
        let coalescer = coalescer();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (_writer, reader) = tokio::io::duplex(64);
        let stats = ingest_lines(BufReader::new(reader), &coalescer, &cancel)
            .await
            .unwrap();
        assert_eq!(stats, IngestStats::default());
    }

    #[tokio::test]
    async fn test_ingest_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"destination":"dataset_run_items","record":{{"id":"d-1"}}}}"#).unwrap();

        let coalescer = coalescer();
        let cancel = CancellationToken::new();
        let handle = tokio::fs::File::open(file.path()).await.unwrap();

        let stats = ingest_lines(BufReader::new(handle), &coalescer, &cancel)
            .await
            .unwrap();
        assert_eq!(stats.enqueued, 1);
        assert_eq!(coalescer.pending_for(Destination::DatasetRunItems), 1);
    }
}

//! Coalescer handle and flush scheduler
//!
//! `Coalescer` is a cheap, cloneable handle that producers share. It owns the
//! write buffer, the batch writer and the interval timer.
//!
//! Two things start a flush cycle:
//! - a producer's `enqueue` that brings a queue to a multiple of
//!   `batch_size` spawns one batch flush for that destination right away
//! - each timer tick sweeps every destination, unless the previous sweep is
//!   still running
//!
//! A threshold flush can overlap an interval sweep on the same destination.
//! They never share items (`take_batch` is atomic), but the store may see two
//! concurrent inserts into one table.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use spool_config::WriterConfig;
use spool_metrics::{MetricsSink, NoopMetrics};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::buffer::WriteBuffer;
use crate::clock::{Clock, TokioClock};
use crate::destination::Destination;
use crate::error::CoalescerError;
use crate::record::Record;
use crate::store::BackingStore;
use crate::writer::{BatchWriter, FlushMode, FlushOutcome};

/// Summary of a completed shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Items queued when the drain started
    pub pending: usize,
    /// Drain passes run
    pub passes: u32,
    /// Items written during the drain
    pub written: usize,
    /// Items dropped during the drain
    pub dropped: usize,
    /// Items still queued afterwards; only non-zero if producers kept
    /// enqueueing during shutdown
    pub remaining: usize,
}

/// Builder for [`Coalescer`]
pub struct CoalescerBuilder {
    config: WriterConfig,
    store: Option<Arc<dyn BackingStore>>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
}

impl CoalescerBuilder {
    fn new(config: WriterConfig) -> Self {
        Self {
            config,
            store: None,
            metrics: Arc::new(NoopMetrics),
            clock: Arc::new(TokioClock),
        }
    }

    /// Set the backing store (required)
    pub fn store(mut self, store: Arc<dyn BackingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the metrics sink
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the clock used for backoff and wait times
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate settings and build the coalescer
    ///
    /// Must be called inside a tokio runtime; the runtime is captured so that
    /// producers on any thread can trigger flushes.
    pub fn build(self) -> Result<Coalescer, CoalescerError> {
        self.config.validate()?;
        let store = self.store.ok_or(CoalescerError::MissingStore)?;
        let runtime = Handle::try_current().map_err(|_| CoalescerError::NoRuntime)?;

        let buffer = Arc::new(WriteBuffer::new());
        let writer = BatchWriter::new(
            &self.config,
            Arc::clone(&buffer),
            store,
            Arc::clone(&self.clock),
            self.metrics,
        );

        Ok(Coalescer {
            inner: Arc::new(Inner {
                batch_size: self.config.batch_size,
                write_interval: self.config.write_interval,
                buffer,
                writer,
                clock: self.clock,
                runtime,
                cancel: CancellationToken::new(),
                started: AtomicBool::new(false),
                sweeping: AtomicBool::new(false),
                skipped_ticks: AtomicU64::new(0),
                timer: Mutex::new(None),
                flushes: TaskTracker::new(),
            }),
        })
    }
}

/// Shared handle to the write coalescer
#[derive(Clone)]
pub struct Coalescer {
    inner: Arc<Inner>,
}

struct Inner {
    batch_size: usize,
    write_interval: Duration,
    buffer: Arc<WriteBuffer>,
    writer: BatchWriter,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    cancel: CancellationToken,
    started: AtomicBool,
    sweeping: AtomicBool,
    skipped_ticks: AtomicU64,
    timer: Mutex<Option<JoinHandle<()>>>,
    flushes: TaskTracker,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Coalescer {
    /// Start building a coalescer
    pub fn builder(config: WriterConfig) -> CoalescerBuilder {
        CoalescerBuilder::new(config)
    }

    /// Build with the tokio clock
    pub fn new(
        config: WriterConfig,
        store: Arc<dyn BackingStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, CoalescerError> {
        Self::builder(config).store(store).metrics(metrics).build()
    }

    /// Queue a record
    ///
    /// Never blocks and never fails. Each time the destination's queue grows
    /// to a multiple of `batch_size`, one batch flush for it is spawned.
    pub fn enqueue(&self, destination: Destination, record: Record) {
        let inner = &self.inner;
        let len = inner.buffer.enqueue(destination, record, inner.clock.now());
        if len % inner.batch_size == 0 {
            let task = Arc::clone(inner);
            inner.flushes.spawn_on(
                async move {
                    task.writer.flush(destination, FlushMode::Batch).await;
                },
                &inner.runtime,
            );
        }
    }

    /// Start the interval timer
    ///
    /// The first sweep runs one `write_interval` after this call.
    pub fn start(&self) -> Result<(), CoalescerError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoalescerError::ShutDown);
        }
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(CoalescerError::AlreadyStarted);
        }

        let task = run_timer(
            Arc::downgrade(&self.inner),
            self.inner.cancel.clone(),
            self.inner.write_interval,
        );
        *self.inner.timer.lock() = Some(self.inner.runtime.spawn(task));

        info!(
            batch_size = self.inner.batch_size,
            interval_ms = self.inner.write_interval.as_millis() as u64,
            "write coalescer started"
        );
        Ok(())
    }

    /// Run one cycle for a single destination
    pub async fn flush(&self, destination: Destination, mode: FlushMode) -> FlushOutcome {
        self.inner.writer.flush(destination, mode).await
    }

    /// Run one cycle for every destination concurrently
    pub async fn flush_all(&self, mode: FlushMode) -> Vec<(Destination, FlushOutcome)> {
        self.inner.flush_all(mode).await
    }

    /// Stop the timer and drain every queue
    ///
    /// Flushes already in flight are allowed to finish. Drain passes
    /// then repeat until the buffer is empty. Each pass writes, drops or
    /// requeues with a higher attempt count every item it takes, so a dead
    /// store ends the loop once every item has used its `max_attempts`.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.inner.cancel.cancel();

        let timer = self.inner.timer.lock().take();
        if let Some(timer) = timer
            && let Err(e) = timer.await
        {
            warn!(error = %e, "flush timer task failed");
        }

        // Let in-flight sweeps and threshold flushes settle first, so
        // their failed items are back in the queue before the drain
        self.inner.flushes.close();
        self.inner.flushes.wait().await;

        let mut report = ShutdownReport {
            pending: self.inner.buffer.total_len(),
            ..ShutdownReport::default()
        };
        info!(pending = report.pending, "write coalescer draining");

        while self.inner.buffer.total_len() > 0 {
            let outcomes = self.inner.flush_all(FlushMode::Drain).await;
            report.passes += 1;

            let mut taken = 0;
            for (_, outcome) in &outcomes {
                taken += outcome.taken;
                report.written += outcome.written;
                report.dropped += outcome.dropped;
            }

            debug!(pass = report.passes, taken, "drain pass finished");
            if taken == 0 {
                break;
            }
        }

        report.remaining = self.inner.buffer.total_len();
        info!(
            passes = report.passes,
            written = report.written,
            dropped = report.dropped,
            remaining = report.remaining,
            "write coalescer shut down"
        );
        report
    }

    /// Items queued across all destinations
    pub fn pending(&self) -> usize {
        self.inner.buffer.total_len()
    }

    /// Items queued for one destination
    pub fn pending_for(&self, destination: Destination) -> usize {
        self.inner.buffer.len(destination)
    }

    /// Ticks skipped because the previous sweep was still running
    pub fn skipped_ticks(&self) -> u64 {
        self.inner.skipped_ticks.load(Ordering::Relaxed)
    }
}

impl Inner {
    async fn flush_all(&self, mode: FlushMode) -> Vec<(Destination, FlushOutcome)> {
        let flushes = Destination::ALL.map(|destination| async move {
            (destination, self.writer.flush(destination, mode).await)
        });
        join_all(flushes).await
    }

    /// Launch an interval sweep unless one is already running
    fn on_tick(self: &Arc<Self>) {
        if self.sweeping.swap(true, Ordering::AcqRel) {
            self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
            debug!("previous interval sweep still running, skipping tick");
            return;
        }

        let guard = SweepGuard(Arc::clone(self));
        self.flushes.spawn_on(
            async move {
                guard.0.flush_all(FlushMode::Batch).await;
            },
            &self.runtime,
        );
    }
}

/// Clears the sweep flag when the sweep ends, however it ends
struct SweepGuard(Arc<Inner>);

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.sweeping.store(false, Ordering::Release);
    }
}

async fn run_timer(inner: Weak<Inner>, cancel: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                inner.on_tick();
            }
        }
    }

    debug!("flush timer stopped");
}

#[cfg(test)]
#[path = "coalescer_test.rs"]
mod coalescer_test;

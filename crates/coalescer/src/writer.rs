//! Batch writer
//!
//! One flush cycle for one destination: take a batch, deliver it, and on
//! failure degrade (split or truncate) or back off and retry, up to
//! `max_delivery_attempts` store calls. Whatever is still undelivered when
//! the cycle gives up goes to the back of the queue, or is dropped once it
//! has used up `max_attempts` cycles.
//!
//! Degradation never outlives the cycle. Truncation is applied to copies of
//! the queued records, so a requeued item is retried in its original form
//! and gets at most one truncation per cycle.

use std::sync::Arc;

use spool_config::{TruncationConfig, WriterConfig};
use spool_metrics::MetricsSink;
use tracing::{debug, warn};

use crate::buffer::{QueueItem, WriteBuffer};
use crate::classify::ErrorClass;
use crate::clock::Clock;
use crate::destination::Destination;
use crate::record::Record;
use crate::retry::Backoff;
use crate::store::{BackingStore, StoreError};
use crate::util::RateLimitedLogger;

/// How much of the queue a cycle takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// At most `batch_size` items
    Batch,
    /// The whole queue, ignoring `batch_size`
    Drain,
}

/// What one flush cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Items taken from the queue
    pub taken: usize,
    /// Items the store accepted
    pub written: usize,
    /// Store calls made
    pub attempts: u32,
    /// Times the batch was halved
    pub splits: u32,
    /// Items pushed back to the front of the queue by splits
    pub split_off: usize,
    /// Whether truncation was applied
    pub truncated: bool,
    /// Items sent to the back of the queue after the cycle failed
    pub requeued: usize,
    /// Items discarded after exhausting their cycles
    pub dropped: usize,
    /// Class of the last store error, `None` if the cycle ended in success
    pub last_error: Option<ErrorClass>,
}

impl FlushOutcome {
    /// Whether the cycle had nothing to do
    pub fn is_empty(&self) -> bool {
        self.taken == 0
    }

    /// Whether the retained batch was delivered
    pub fn succeeded(&self) -> bool {
        self.taken > 0 && self.last_error.is_none()
    }
}

/// Runs flush cycles against a backing store
pub struct BatchWriter {
    buffer: Arc<WriteBuffer>,
    store: Arc<dyn BackingStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsSink>,
    logger: RateLimitedLogger,
    batch_size: usize,
    max_delivery_attempts: u32,
    max_attempts: u32,
    backoff: Backoff,
    truncation: TruncationConfig,
}

impl BatchWriter {
    pub fn new(
        config: &WriterConfig,
        buffer: Arc<WriteBuffer>,
        store: Arc<dyn BackingStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            buffer,
            store,
            clock,
            metrics,
            logger: RateLimitedLogger::default(),
            batch_size: config.batch_size,
            max_delivery_attempts: config.max_delivery_attempts.max(1),
            max_attempts: config.max_attempts.max(1),
            backoff: Backoff::from_config(config),
            truncation: config.truncation.clone(),
        }
    }

    /// Run one flush cycle for a destination
    pub async fn flush(&self, destination: Destination, mode: FlushMode) -> FlushOutcome {
        if self.buffer.is_empty(destination) {
            return FlushOutcome::default();
        }

        let max = match mode {
            FlushMode::Batch => self.batch_size,
            FlushMode::Drain => usize::MAX,
        };
        let items = self.buffer.take_batch(destination, max);
        if items.is_empty() {
            return FlushOutcome::default();
        }

        let tag = destination.as_str();
        let started = self.clock.now();
        self.metrics.queue_depth(tag, self.buffer.len(destination));
        for item in &items {
            self.metrics
                .wait_time(tag, started.saturating_duration_since(item.enqueued_at));
        }

        debug!(destination = %destination, count = items.len(), ?mode, "flush cycle starting");
        self.deliver(destination, items).await
    }

    /// Attempt loop over one taken batch
    async fn deliver(&self, destination: Destination, mut items: Vec<QueueItem>) -> FlushOutcome {
        let tag = destination.as_str();
        let codec = destination.codec();

        let mut outcome = FlushOutcome {
            taken: items.len(),
            ..FlushOutcome::default()
        };
        let mut payloads: Vec<Record> = items.iter().map(|item| item.record.clone()).collect();
        let mut truncated = false;
        let mut last_error: Option<StoreError> = None;

        for attempt in 1..=self.max_delivery_attempts {
            if attempt > 1 {
                self.clock.sleep(self.backoff.delay(attempt - 1)).await;
            }

            outcome.attempts = attempt;
            self.metrics.request(tag);
            let call_started = self.clock.now();

            let error = match self.store.write(destination, &payloads).await {
                Ok(()) => {
                    let elapsed = self.clock.now().saturating_duration_since(call_started);
                    self.metrics.processing_time(tag, elapsed, payloads.len());
                    outcome.written = payloads.len();
                    outcome.last_error = None;
                    debug!(
                        destination = %destination,
                        count = payloads.len(),
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "batch written"
                    );
                    return outcome;
                }
                Err(error) => error,
            };

            self.metrics.write_error(tag);
            let class = error.class();
            outcome.last_error = Some(class);
            warn!(
                destination = %destination,
                attempt,
                max_delivery_attempts = self.max_delivery_attempts,
                class = %class,
                count = payloads.len(),
                error = %error,
                "store write failed"
            );
            last_error = Some(error);

            // Degrading only pays off if another store call follows
            if attempt == self.max_delivery_attempts {
                break;
            }

            match class {
                ErrorClass::Retryable => {}
                ErrorClass::StringOverflow if payloads.len() > 1 => {
                    let keep = payloads.len() / 2;
                    let rest = items.split_off(keep);
                    payloads.truncate(keep);

                    outcome.splits += 1;
                    outcome.split_off += rest.len();
                    self.metrics.split(tag);
                    warn!(
                        destination = %destination,
                        kept = keep,
                        requeued = rest.len(),
                        "splitting batch after string overflow"
                    );
                    self.buffer.requeue_front(destination, rest);
                }
                ErrorClass::StringOverflow | ErrorClass::OversizedPayload if !truncated => {
                    let changed = payloads
                        .iter_mut()
                        .map(|record| codec.truncate(record, &self.truncation))
                        .filter(|&fields| fields > 0)
                        .count();
                    truncated = true;
                    outcome.truncated = true;
                    self.metrics.truncated(tag, changed);
                    warn!(
                        destination = %destination,
                        records = changed,
                        threshold = self.truncation.threshold,
                        "truncating oversized fields"
                    );
                }
                _ => break,
            }
        }

        self.settle_failure(destination, items, last_error.as_ref(), &mut outcome);
        outcome
    }

    /// Requeue or drop whatever a failed cycle still holds
    fn settle_failure(
        &self,
        destination: Destination,
        items: Vec<QueueItem>,
        error: Option<&StoreError>,
        outcome: &mut FlushOutcome,
    ) {
        let tag = destination.as_str();
        let (mut retry, exhausted): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|item| item.attempts < self.max_attempts);

        for item in &mut retry {
            item.attempts += 1;
        }

        outcome.requeued = retry.len();
        outcome.dropped = exhausted.len();
        let now = self.clock.now();

        if let Some(error) = error {
            self.logger
                .cycle_failed(destination, now, outcome.attempts, error);
        }

        if !retry.is_empty() {
            self.metrics.requeued(tag, retry.len());
            self.buffer.requeue_back(destination, retry);
        }

        if !exhausted.is_empty() {
            self.metrics.dropped(tag, exhausted.len());
            self.logger.dropped(
                destination,
                now,
                exhausted.len(),
                error.map(|e| e as &dyn std::fmt::Display),
            );
        }
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;

//! Spool write coalescer
//!
//! Buffers records per destination table and flushes them to a backing store
//! in batches, either when a queue reaches `batch_size` or on a fixed
//! interval.
//!
//! # Delivery
//!
//! - at-least-once: a batch can be written again after a retry, so stores
//!   must upsert by record identity
//! - failures are classified from the error text; transient ones are retried
//!   with backoff, oversized batches are split or have their large fields
//!   truncated, unknown errors stop the cycle
//! - records that fail `max_attempts` cycles are dropped and counted
//! - queues are unbounded and in memory; only `shutdown()` guarantees they
//!   are drained
//!
//! # Example
//!
//! ```ignore
//! let store = spool_coalescer::build_store(&config.store)?;
//! let coalescer = Coalescer::new(config.writer, store, metrics)?;
//! coalescer.start()?;
//!
//! coalescer.enqueue(Destination::Traces, record);
//!
//! let report = coalescer.shutdown().await;
//! ```

pub mod buffer;
pub mod classify;
pub mod clock;
pub mod codec;
mod coalescer;
pub mod destination;
mod error;
pub mod record;
pub mod retry;
pub mod store;
mod util;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use buffer::{QueueItem, WriteBuffer};
pub use classify::{ErrorClass, classify, classify_message};
pub use clock::{Clock, ManualClock, TokioClock};
pub use codec::{FieldCodec, FieldKind, FieldSpec, RecordCodec};
pub use coalescer::{Coalescer, CoalescerBuilder, ShutdownReport};
pub use destination::{Destination, UnknownDestination};
pub use error::CoalescerError;
pub use record::Record;
pub use retry::Backoff;
pub use store::{BackingStore, ClickHouseStore, StdoutStore, StoreError, build_store};
pub use writer::{BatchWriter, FlushMode, FlushOutcome};

//! Rate-limited logging for per-destination failures
//!
//! A store outage makes every flush cycle fail and eventually drop items.
//! Logging each one would flood the output, so each destination logs at
//! most once per interval and reports how many events it swallowed since.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::destination::Destination;

/// Default interval between logged events per destination
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct Slot {
    last_logged: Mutex<Option<Instant>>,
    suppressed: AtomicU64,
}

impl Slot {
    /// Returns the number of suppressed events to report, or `None` if this
    /// event is suppressed too
    fn admit(&self, now: Instant, interval: Duration) -> Option<u64> {
        let mut last = self.last_logged.lock();
        match *last {
            Some(at) if now.saturating_duration_since(at) < interval => {
                self.suppressed.fetch_add(1, Ordering::Relaxed);
                None
            }
            _ => {
                *last = Some(now);
                Some(self.suppressed.swap(0, Ordering::Relaxed))
            }
        }
    }
}

/// Logs at most once per interval per destination and event kind
#[derive(Debug)]
pub struct RateLimitedLogger {
    interval: Duration,
    failures: [Slot; Destination::COUNT],
    drops: [Slot; Destination::COUNT],
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}

impl RateLimitedLogger {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            failures: Default::default(),
            drops: Default::default(),
        }
    }

    /// A flush cycle ended without delivering its batch
    ///
    /// Returns true if the event was logged.
    pub fn cycle_failed(
        &self,
        destination: Destination,
        now: Instant,
        attempts: u32,
        error: &dyn std::fmt::Display,
    ) -> bool {
        let Some(suppressed) = self.failures[destination.index()].admit(now, self.interval) else {
            return false;
        };
        tracing::warn!(
            destination = %destination,
            attempts,
            suppressed,
            error = %error,
            "flush cycle failed"
        );
        true
    }

    /// Items exhausted their cycle budget and were discarded
    ///
    /// Returns true if the event was logged.
    pub fn dropped(
        &self,
        destination: Destination,
        now: Instant,
        count: usize,
        error: Option<&dyn std::fmt::Display>,
    ) -> bool {
        let Some(suppressed) = self.drops[destination.index()].admit(now, self.interval) else {
            return false;
        };
        match error {
            Some(error) => tracing::error!(
                destination = %destination,
                count,
                suppressed,
                error = %error,
                "dropping records after exhausting flush cycles"
            ),
            None => tracing::error!(
                destination = %destination,
                count,
                suppressed,
                "dropping records after exhausting flush cycles"
            ),
        }
        true
    }

    /// Events swallowed since the last logged one
    pub fn suppressed_drops(&self, destination: Destination) -> u64 {
        self.drops[destination.index()]
            .suppressed
            .load(Ordering::Relaxed)
    }
}

//! Write coalescer configuration
//!
//! Batching, retry and truncation settings shared by every destination.

use serde::Deserialize;
use std::time::Duration;

/// Default number of records per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default interval between scheduled flush sweeps
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of store calls within one flush cycle
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Default number of cycles a record may take part in before it is dropped
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default size above which a size-sensitive field is truncated (1 MiB)
pub const DEFAULT_TRUNCATION_THRESHOLD: usize = 1024 * 1024;

/// Default number of bytes kept from a truncated field (100 KiB)
pub const DEFAULT_TRUNCATION_PREFIX_LENGTH: usize = 100 * 1024;

/// Default marker appended to truncated fields
pub const DEFAULT_TRUNCATION_MARKER: &str = "...[truncated: field exceeded size limit]";

/// Write coalescer configuration
///
/// # Example
///
/// ```toml
/// [writer]
/// batch_size = 1000
/// write_interval = "1s"
/// max_delivery_attempts = 3
/// max_attempts = 3
/// retry_base_delay = "100ms"
/// retry_max_delay = "10s"
///
/// [writer.truncation]
/// threshold = 1048576
/// prefix_length = 102400
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Queue length that triggers an immediate flush, and the size of a
    /// scheduled batch
    pub batch_size: usize,

    /// Period of the scheduled flush sweep
    #[serde(with = "humantime_serde")]
    pub write_interval: Duration,

    /// Store calls allowed within one flush cycle
    pub max_delivery_attempts: u32,

    /// Cycles a record may fail before it is dropped
    pub max_attempts: u32,

    /// Delay before the second store call of a cycle; doubles after that
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Upper bound for the delay between store calls
    #[serde(with = "humantime_serde")]
    pub retry_max_delay: Duration,

    /// Field truncation applied when the store rejects oversized payloads
    pub truncation: TruncationConfig,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            write_interval: DEFAULT_WRITE_INTERVAL,
            max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(10),
            truncation: TruncationConfig::default(),
        }
    }
}

impl WriterConfig {
    /// Set the batch size
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the scheduled flush interval
    pub fn with_write_interval(mut self, interval: Duration) -> Self {
        self.write_interval = interval;
        self
    }

    /// Set the number of store calls per cycle
    pub fn with_max_delivery_attempts(mut self, attempts: u32) -> Self {
        self.max_delivery_attempts = attempts;
        self
    }

    /// Set the number of cycles before a record is dropped
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set base and maximum retry delay
    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    /// Set the truncation settings
    pub fn with_truncation(mut self, truncation: TruncationConfig) -> Self {
        self.truncation = truncation;
        self
    }

    /// Check limits, delay ordering and the truncation bound
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> crate::Result<()> {
        crate::validation::validate_writer(self)
    }
}

/// Truncation settings for size-sensitive fields
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TruncationConfig {
    /// Fields longer than this many bytes are truncated
    pub threshold: usize,

    /// Bytes kept from the start of a truncated field
    pub prefix_length: usize,

    /// Appended after the kept prefix
    pub marker: String,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_TRUNCATION_THRESHOLD,
            prefix_length: DEFAULT_TRUNCATION_PREFIX_LENGTH,
            marker: DEFAULT_TRUNCATION_MARKER.to_string(),
        }
    }
}

impl TruncationConfig {
    /// Create truncation settings with the default marker
    pub fn new(threshold: usize, prefix_length: usize) -> Self {
        Self {
            threshold,
            prefix_length,
            marker: DEFAULT_TRUNCATION_MARKER.to_string(),
        }
    }

    /// Longest possible truncated field
    pub fn truncated_len(&self) -> usize {
        self.prefix_length + self.marker.len()
    }
}

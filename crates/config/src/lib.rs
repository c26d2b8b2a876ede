//! Spool Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use spool_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[writer]\nbatch_size = 500").unwrap();
//! assert_eq!(config.writer.batch_size, 500);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [writer]
//! batch_size = 1000
//! write_interval = "1s"
//!
//! [store]
//! url = "http://localhost:8123"
//! ```

mod error;
mod logging;
mod metrics;
mod store;
mod validation;
mod writer;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{DEFAULT_METRICS_INTERVAL, MetricsConfig, MetricsFormat};
pub use store::{
    DEFAULT_MAX_BODY_BYTES, DEFAULT_STORE_TIMEOUT, KNOWN_DESTINATIONS, StoreConfig, StoreKind,
    is_known_destination,
};
pub use writer::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELIVERY_ATTEMPTS,
    DEFAULT_TRUNCATION_MARKER, DEFAULT_TRUNCATION_PREFIX_LENGTH, DEFAULT_TRUNCATION_THRESHOLD,
    DEFAULT_WRITE_INTERVAL, TruncationConfig, WriterConfig,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,

    /// Batching, retry and truncation settings
    pub writer: WriterConfig,

    /// Backing store connection
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

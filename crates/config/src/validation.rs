//! Configuration validation
//!
//! Validates config consistency:
//! - Writer limits are non-zero and retry delays are ordered
//! - A truncated field always fits under the truncation threshold
//! - The selected store has what it needs to connect
//! - Table overrides only name known destinations

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::store::{StoreKind, is_known_destination};
use crate::writer::WriterConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_writer(&config.writer)?;
    validate_store(config)?;
    if config.metrics.enabled && config.metrics.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "metrics",
            "interval",
            "must be greater than 0",
        ));
    }
    Ok(())
}

/// Validate batching, retry and truncation settings
pub(crate) fn validate_writer(writer: &WriterConfig) -> Result<()> {
    if writer.batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "writer",
            "batch_size",
            "must be greater than 0",
        ));
    }
    if writer.write_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "writer",
            "write_interval",
            "must be greater than 0",
        ));
    }
    if writer.max_delivery_attempts == 0 {
        return Err(ConfigError::invalid_value(
            "writer",
            "max_delivery_attempts",
            "must be at least 1",
        ));
    }
    if writer.max_attempts == 0 {
        return Err(ConfigError::invalid_value(
            "writer",
            "max_attempts",
            "must be at least 1",
        ));
    }
    if writer.retry_base_delay > writer.retry_max_delay {
        return Err(ConfigError::invalid_value(
            "writer",
            "retry_base_delay",
            "must not exceed retry_max_delay",
        ));
    }

    let truncation = &writer.truncation;
    if truncation.truncated_len() > truncation.threshold {
        return Err(ConfigError::invalid_value(
            "writer.truncation",
            "prefix_length",
            format!(
                "prefix_length ({}) plus marker ({}) exceeds threshold ({})",
                truncation.prefix_length,
                truncation.marker.len(),
                truncation.threshold
            ),
        ));
    }

    Ok(())
}

/// Validate store settings
fn validate_store(config: &Config) -> Result<()> {
    let store = &config.store;

    if store.kind == StoreKind::Clickhouse {
        if store.url.trim().is_empty() {
            return Err(ConfigError::missing_field("store", "url"));
        }
        if store.database.trim().is_empty() {
            return Err(ConfigError::missing_field("store", "database"));
        }
    }
    if store.max_body_bytes == 0 {
        return Err(ConfigError::invalid_value(
            "store",
            "max_body_bytes",
            "must be greater than 0",
        ));
    }

    for (destination, table) in &store.tables {
        if !is_known_destination(destination) {
            return Err(ConfigError::unknown_destination(destination));
        }
        if table.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "store.tables",
                "table",
                format!("empty table name for '{}'", destination),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = Config::from_str("[writer]\nbatch_size = 0").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = Config::from_str("[writer]\nmax_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));

        let err = Config::from_str("[writer]\nmax_delivery_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("max_delivery_attempts"));
    }

    #[test]
    fn test_retry_delays_ordered() {
        let toml = r#"
[writer]
retry_base_delay = "5s"
retry_max_delay = "1s"
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("retry_base_delay"));
    }

    #[test]
    fn test_truncation_bound() {
        let toml = r#"
[writer.truncation]
threshold = 100
prefix_length = 90
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("exceeds threshold"));
    }

    #[test]
    fn test_clickhouse_requires_url() {
        let err = Config::from_str("[store]\nurl = \"\"").unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_stdout_store_skips_url() {
        let config = Config::from_str("[store]\nkind = \"stdout\"\nurl = \"\"").unwrap();
        assert_eq!(config.store.kind, StoreKind::Stdout);
    }

    #[test]
    fn test_unknown_table_override() {
        let toml = r#"
[store.tables]
spans = "spans_v1"
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDestination { .. }));
    }
}

//! Backing store configuration
//!
//! Selects where flushed batches are written and how to reach it.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Destination tags accepted in `store.tables`
pub const KNOWN_DESTINATIONS: &[&str] = &[
    "traces",
    "observations",
    "scores",
    "dataset_run_items",
    "blob_storage_file_log",
];

/// Check whether a destination tag is known
pub fn is_known_destination(tag: &str) -> bool {
    KNOWN_DESTINATIONS.contains(&tag)
}

/// Default request body limit for a single insert (64 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Default HTTP request timeout
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Backing store type
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// ClickHouse over HTTP (default)
    #[default]
    Clickhouse,
    /// JSON lines on stdout (dry runs)
    Stdout,
}

/// Backing store configuration
///
/// # Example
///
/// ```toml
/// [store]
/// kind = "clickhouse"
/// url = "http://localhost:8123"
/// database = "default"
/// timeout = "30s"
///
/// [store.tables]
/// observations = "observations_v2"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store type
    pub kind: StoreKind,

    /// ClickHouse HTTP URL
    pub url: String,

    /// Database name
    pub database: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Request timeout for one insert
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Largest request body the adapter will build for one insert
    pub max_body_bytes: usize,

    /// Table name overrides keyed by destination tag
    pub tables: HashMap<String, String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Clickhouse,
            url: "http://localhost:8123".into(),
            database: "default".into(),
            username: None,
            password: None,
            timeout: DEFAULT_STORE_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            tables: HashMap::new(),
        }
    }
}

impl StoreConfig {
    /// Resolve the table name for a destination tag
    pub fn table_for<'a>(&'a self, destination: &'a str) -> &'a str {
        self.tables
            .get(destination)
            .map(String::as_str)
            .unwrap_or(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.kind, StoreKind::Clickhouse);
        assert_eq!(config.url, "http://localhost:8123");
        assert_eq!(config.database, "default");
        assert!(config.username.is_none());
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_table_overrides() {
        let toml = r#"
kind = "clickhouse"
url = "http://ch:8123"

[tables]
observations = "observations_v2"
"#;
        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.table_for("observations"), "observations_v2");
        assert_eq!(config.table_for("traces"), "traces");
    }

    #[test]
    fn test_stdout_kind() {
        let config: StoreConfig = toml::from_str("kind = \"stdout\"").unwrap();
        assert_eq!(config.kind, StoreKind::Stdout);
    }

    #[test]
    fn test_known_destinations() {
        assert!(is_known_destination("traces"));
        assert!(is_known_destination("blob_storage_file_log"));
        assert!(!is_known_destination("spans"));
    }
}

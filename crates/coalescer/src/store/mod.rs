//! Backing store adapters
//!
//! The batch writer hands each delivery attempt to a `BackingStore`. Stores
//! are expected to upsert by record identity: a batch may be delivered more
//! than once after a retry, and a threshold flush may race an interval flush
//! for the same table with disjoint records.

mod clickhouse;
mod stdout;

use std::sync::Arc;

use async_trait::async_trait;
use spool_config::{StoreConfig, StoreKind};

use crate::classify::{ErrorClass, classify};
use crate::destination::Destination;
use crate::record::Record;

pub use clickhouse::ClickHouseStore;
pub use stdout::StdoutStore;

/// Errors from a store write
///
/// Display text is what the classifier matches on, so variants keep the
/// store's own wording.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store answered with a non-success status
    #[error("clickhouse returned HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Request never completed
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialized insert body would exceed the configured limit
    #[error("invalid string length: insert body for '{table}' exceeds {limit} bytes")]
    BodyTooLarge { table: String, limit: usize },

    /// Record could not be serialized
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Local I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else, by message
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Error carrying only a message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Classify for the batch writer
    ///
    /// Transport timeouts, connect failures and 429 responses are retryable
    /// whatever their text says; everything else goes by message.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transport(e) if e.is_timeout() || e.is_connect() => ErrorClass::Retryable,
            Self::Http { status, .. } if *status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                ErrorClass::Retryable
            }
            _ => classify(self),
        }
    }
}

/// Where flushed batches go
#[async_trait]
pub trait BackingStore: Send + Sync + 'static {
    /// Write one batch of records to the destination's table
    async fn write(&self, destination: Destination, records: &[Record]) -> Result<(), StoreError>;
}

/// Build the store selected by configuration
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn BackingStore>, StoreError> {
    Ok(match config.kind {
        StoreKind::Clickhouse => Arc::new(ClickHouseStore::new(config.clone())?),
        StoreKind::Stdout => Arc::new(StdoutStore::new()),
    })
}

/// Serialize records as newline-delimited JSON through the destination codec
pub(crate) fn encode_rows(
    destination: Destination,
    records: &[Record],
    out: &mut Vec<u8>,
) -> Result<(), serde_json::Error> {
    let codec = destination.codec();
    for record in records {
        codec.serialize(record, out)?;
        out.push(b'\n');
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_errors_classify_by_reason_phrase() {
        let error = StoreError::Http {
            status: reqwest::StatusCode::PAYLOAD_TOO_LARGE,
            body: String::new(),
        };
        assert_eq!(classify(&error), ErrorClass::OversizedPayload);

        let error = StoreError::Http {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "overloaded".into(),
        };
        assert_eq!(classify(&error), ErrorClass::Retryable);

        let error = StoreError::Http {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "Code: 60. DB::Exception: Unknown table".into(),
        };
        assert_eq!(classify(&error), ErrorClass::Fatal);
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let error = StoreError::Http {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "Code: 202. DB::Exception: Too many simultaneous queries".into(),
        };
        assert_eq!(error.class(), ErrorClass::Retryable);
    }

    #[test]
    fn test_body_too_large_is_string_overflow() {
        let error = StoreError::BodyTooLarge {
            table: "traces".into(),
            limit: 1024,
        };
        assert_eq!(classify(&error), ErrorClass::StringOverflow);
    }

    #[test]
    fn test_encode_rows() {
        let records = vec![
            Record::new().with("id", "a"),
            Record::new().with("id", "b"),
        ];
        let mut out = Vec::new();
        encode_rows(Destination::Traces, &records, &mut out).unwrap();
        assert_eq!(out, b"{\"id\":\"a\"}\n{\"id\":\"b\"}\n");
    }

    #[tokio::test]
    async fn test_build_store_kinds() {
        let config = StoreConfig {
            kind: StoreKind::Stdout,
            ..StoreConfig::default()
        };
        assert!(build_store(&config).is_ok());
        assert!(build_store(&StoreConfig::default()).is_ok());
    }
}

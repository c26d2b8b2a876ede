//! ClickHouse HTTP adapter
//!
//! Each write is one `INSERT INTO <table> FORMAT JSONEachRow` request. The
//! adapter does not retry; the batch writer owns retry and degradation.

use async_trait::async_trait;
use spool_config::StoreConfig;

use super::{BackingStore, StoreError, encode_rows};
use crate::destination::Destination;
use crate::record::Record;

/// Writes batches to ClickHouse over its HTTP interface
#[derive(Debug, Clone)]
pub struct ClickHouseStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl ClickHouseStore {
    /// Create a store with an HTTP client using the configured timeout
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Table name for a destination, honoring overrides
    pub fn table(&self, destination: Destination) -> &str {
        self.config.table_for(destination.as_str())
    }

    fn insert_query(table: &str) -> String {
        format!("INSERT INTO {table} FORMAT JSONEachRow")
    }
}

#[async_trait]
impl BackingStore for ClickHouseStore {
    async fn write(&self, destination: Destination, records: &[Record]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let table = self.table(destination);
        let mut body = Vec::new();
        encode_rows(destination, records, &mut body)?;

        if body.len() > self.config.max_body_bytes {
            return Err(StoreError::BodyTooLarge {
                table: table.to_string(),
                limit: self.config.max_body_bytes,
            });
        }

        let query = Self::insert_query(table);
        let mut request = self
            .client
            .post(&self.config.url)
            .query(&[("database", self.config.database.as_str()), ("query", query.as_str())]);

        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let response = request
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(table = %table, rows = records.len(), "clickhouse insert ok");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status,
            body: body.trim().to_string(),
        })
    }
}

//! Stdout adapter for dry runs
//!
//! Prints one JSON line per record, tagged with its destination.

use std::io::Write;

use async_trait::async_trait;

use super::{BackingStore, StoreError};
use crate::destination::Destination;
use crate::record::Record;

/// Writes every record to stdout as `{"destination": ..., "record": ...}`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutStore;

impl StdoutStore {
    pub fn new() -> Self {
        Self
    }

    fn render(destination: Destination, records: &[Record]) -> Result<Vec<u8>, StoreError> {
        let codec = destination.codec();
        let mut out = Vec::new();
        for record in records {
            write!(out, "{{\"destination\":\"{destination}\",\"record\":")?;
            codec.serialize(record, &mut out)?;
            out.extend_from_slice(b"}\n");
        }
        Ok(out)
    }
}

#[async_trait]
impl BackingStore for StdoutStore {
    async fn write(&self, destination: Destination, records: &[Record]) -> Result<(), StoreError> {
        let out = Self::render(destination, records)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&out)?;
        stdout.flush()?;
        Ok(())
    }
}

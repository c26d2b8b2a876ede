//! Test doubles shared by the crate's unit tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::destination::Destination;
use crate::record::Record;
use crate::store::{BackingStore, StoreError};

/// One call the store received
#[derive(Debug, Clone)]
pub struct WriteCall {
    pub destination: Destination,
    pub records: Vec<Record>,
    pub ok: bool,
}

/// Store that fails on a script and records every call
#[derive(Debug, Default)]
pub struct MockStore {
    script: Mutex<VecDeque<String>>,
    always: Mutex<Option<String>>,
    calls: Mutex<Vec<WriteCall>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls with `message`
    pub fn fail_times(self, message: &str, times: usize) -> Self {
        self.script
            .lock()
            .extend(std::iter::repeat_n(message.to_string(), times));
        self
    }

    /// Fail every call with `message`
    pub fn fail_always(self, message: &str) -> Self {
        *self.always.lock() = Some(message.to_string());
        self
    }

    /// Stop failing
    pub fn heal(&self) {
        self.script.lock().clear();
        *self.always.lock() = None;
    }

    /// Every call, successful or not
    pub fn calls(&self) -> Vec<WriteCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Batch size of each call, in order
    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|c| c.records.len()).collect()
    }

    /// Records accepted for a destination, in delivery order
    pub fn written(&self, destination: Destination) -> Vec<Record> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.ok && c.destination == destination)
            .flat_map(|c| c.records.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl BackingStore for MockStore {
    async fn write(&self, destination: Destination, records: &[Record]) -> Result<(), StoreError> {
        let failure = self
            .script
            .lock()
            .pop_front()
            .or_else(|| self.always.lock().clone());

        self.calls.lock().push(WriteCall {
            destination,
            records: records.to_vec(),
            ok: failure.is_none(),
        });

        match failure {
            Some(message) => Err(StoreError::other(message)),
            None => Ok(()),
        }
    }
}

/// Record with a numeric id
pub fn record(id: usize) -> Record {
    Record::new().with("id", id)
}

/// Ids of records, in order
pub fn ids(records: &[Record]) -> Vec<u64> {
    records
        .iter()
        .map(|r| r.get("id").and_then(|v| v.as_u64()).unwrap_or(u64::MAX))
        .collect()
}

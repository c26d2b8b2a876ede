//! Write buffer
//!
//! One FIFO queue per destination. Every operation takes the queue's lock
//! once, so two concurrent `take_batch` calls never see the same item.
//!
//! There is no capacity bound: a producer that outpaces the store grows
//! memory without limit.

use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;

use crate::destination::Destination;
use crate::record::Record;

/// A buffered record with its delivery bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// The payload
    pub record: Record,
    /// When the producer enqueued it
    pub enqueued_at: Instant,
    /// Flush cycles this item has taken part in, starting at 1
    pub attempts: u32,
}

impl QueueItem {
    /// Fresh item for a newly enqueued record
    pub fn new(record: Record, enqueued_at: Instant) -> Self {
        Self {
            record,
            enqueued_at,
            attempts: 1,
        }
    }
}

/// Per-destination in-memory queues
#[derive(Debug)]
pub struct WriteBuffer {
    queues: [Mutex<VecDeque<QueueItem>>; Destination::COUNT],
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBuffer {
    /// Create empty queues for every destination
    pub fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| Mutex::new(VecDeque::new())),
        }
    }

    #[inline]
    fn queue(&self, destination: Destination) -> &Mutex<VecDeque<QueueItem>> {
        &self.queues[destination.index()]
    }

    /// Append a record; returns the queue length after the append
    pub fn enqueue(&self, destination: Destination, record: Record, now: Instant) -> usize {
        let mut queue = self.queue(destination).lock();
        queue.push_back(QueueItem::new(record, now));
        queue.len()
    }

    /// Remove and return up to `max` items from the front
    pub fn take_batch(&self, destination: Destination, max: usize) -> Vec<QueueItem> {
        let mut queue = self.queue(destination).lock();
        let count = max.min(queue.len());
        queue.drain(..count).collect()
    }

    /// Remove and return every queued item
    pub fn drain_all(&self, destination: Destination) -> Vec<QueueItem> {
        self.queue(destination).lock().drain(..).collect()
    }

    /// Put items back at the head, keeping their relative order
    pub fn requeue_front(&self, destination: Destination, items: Vec<QueueItem>) {
        if items.is_empty() {
            return;
        }
        let mut queue = self.queue(destination).lock();
        for item in items.into_iter().rev() {
            queue.push_front(item);
        }
    }

    /// Put items back at the tail, keeping their relative order
    pub fn requeue_back(&self, destination: Destination, items: Vec<QueueItem>) {
        if items.is_empty() {
            return;
        }
        self.queue(destination).lock().extend(items);
    }

    /// Queue length for one destination
    pub fn len(&self, destination: Destination) -> usize {
        self.queue(destination).lock().len()
    }

    /// Whether a destination has nothing queued
    pub fn is_empty(&self, destination: Destination) -> bool {
        self.queue(destination).lock().is_empty()
    }

    /// Items queued across all destinations
    pub fn total_len(&self) -> usize {
        Destination::ALL.into_iter().map(|d| self.len(d)).sum()
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;

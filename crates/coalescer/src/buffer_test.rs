//! Tests for the per-destination write buffer

use std::sync::Arc;
use std::time::Instant;

use super::*;

fn record(id: usize) -> Record {
    Record::new().with("id", id)
}

fn ids(items: &[QueueItem]) -> Vec<u64> {
    items
        .iter()
        .map(|item| item.record.get("id").and_then(|v| v.as_u64()).unwrap())
        .collect()
}

fn fill(buffer: &WriteBuffer, destination: Destination, n: usize) {
    let now = Instant::now();
    for i in 0..n {
        buffer.enqueue(destination, record(i), now);
    }
}

#[test]
fn test_enqueue_returns_length() {
    let buffer = WriteBuffer::new();
    let now = Instant::now();
    assert_eq!(buffer.enqueue(Destination::Traces, record(0), now), 1);
    assert_eq!(buffer.enqueue(Destination::Traces, record(1), now), 2);
    assert_eq!(buffer.enqueue(Destination::Scores, record(2), now), 1);
    assert_eq!(buffer.total_len(), 3);
}

#[test]
fn test_new_items_start_at_one_attempt() {
    let buffer = WriteBuffer::new();
    fill(&buffer, Destination::Traces, 1);
    let items = buffer.take_batch(Destination::Traces, 10);
    assert_eq!(items[0].attempts, 1);
}

#[test]
fn test_take_batch_is_fifo_and_bounded() {
    let buffer = WriteBuffer::new();
    fill(&buffer, Destination::Observations, 5);

    let batch = buffer.take_batch(Destination::Observations, 3);
    assert_eq!(ids(&batch), vec![0, 1, 2]);
    assert_eq!(buffer.len(Destination::Observations), 2);

    let rest = buffer.take_batch(Destination::Observations, 10);
    assert_eq!(ids(&rest), vec![3, 4]);
    assert!(buffer.is_empty(Destination::Observations));
    assert!(buffer.take_batch(Destination::Observations, 10).is_empty());
}

#[test]
fn test_queues_are_independent() {
    let buffer = WriteBuffer::new();
    fill(&buffer, Destination::Traces, 3);
    fill(&buffer, Destination::Scores, 2);

    assert_eq!(buffer.drain_all(Destination::Traces).len(), 3);
    assert_eq!(buffer.len(Destination::Scores), 2);
    assert!(buffer.is_empty(Destination::DatasetRunItems));
}

#[test]
fn test_requeue_front_keeps_relative_order() {
    let buffer = WriteBuffer::new();
    fill(&buffer, Destination::Traces, 6);

    let mut batch = buffer.take_batch(Destination::Traces, 4);
    let tail = batch.split_off(2);
    buffer.requeue_front(Destination::Traces, tail);

    let all = buffer.drain_all(Destination::Traces);
    assert_eq!(ids(&all), vec![2, 3, 4, 5]);
}

#[test]
fn test_requeue_back_appends() {
    let buffer = WriteBuffer::new();
    fill(&buffer, Destination::Traces, 4);

    let batch = buffer.take_batch(Destination::Traces, 2);
    buffer.requeue_back(Destination::Traces, batch);

    let all = buffer.drain_all(Destination::Traces);
    assert_eq!(ids(&all), vec![2, 3, 0, 1]);
}

#[test]
fn test_requeue_empty_is_noop() {
    let buffer = WriteBuffer::new();
    buffer.requeue_front(Destination::Traces, Vec::new());
    buffer.requeue_back(Destination::Traces, Vec::new());
    assert_eq!(buffer.total_len(), 0);
}

#[test]
fn test_concurrent_takes_never_overlap() {
    let buffer = Arc::new(WriteBuffer::new());
    fill(&buffer, Destination::Observations, 10_000);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let batch = buffer.take_batch(Destination::Observations, 37);
                    if batch.is_empty() {
                        break seen;
                    }
                    seen.extend(ids(&batch));
                }
            })
        })
        .collect();

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..10_000).collect::<Vec<u64>>());
}

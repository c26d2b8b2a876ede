//! Input envelopes
//!
//! One JSON object per line: `{"destination": "traces", "record": {...}}`.

use serde::Deserialize;
use spool_coalescer::{Destination, Record};

#[derive(Debug, Deserialize)]
struct Envelope {
    destination: Destination,
    record: Record,
}

/// Parse one input line; blank lines yield `Ok(None)`
///
/// Fails on invalid JSON, an unknown destination, or a `record` that is not
/// an object.
pub fn parse_line(line: &str) -> serde_json::Result<Option<(Destination, Record)>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let envelope: Envelope = serde_json::from_str(line)?;
    Ok(Some((envelope.destination, envelope.record)))
}

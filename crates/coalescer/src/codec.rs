//! Record codecs
//!
//! A `RecordCodec` knows which fields of a destination's records can grow
//! without bound (prompt input, model output, metadata maps) and how to cut
//! them down when the store rejects a payload as too large.
//!
//! Truncation keeps the first `prefix_length` bytes of an oversized field
//! (rounded down to a char boundary) and appends the marker. Because
//! `prefix_length + marker.len() <= threshold` is enforced by config
//! validation, truncating an already truncated field is a no-op.

use serde_json::Value;
use spool_config::TruncationConfig;

use crate::record::Record;

/// How a size-sensitive field is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string column
    Text,
    /// Arbitrary JSON; non-string values are measured by their serialization
    Json,
    /// Object of string values, each measured on its own
    Map,
}

/// A size-sensitive field of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Plain string field
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    /// JSON field
    pub const fn json(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Json,
        }
    }

    /// Map-of-strings field
    pub const fn map(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Map,
        }
    }
}

/// Per-destination record capability: size-sensitive fields, truncation,
/// serialization
pub trait RecordCodec: Send + Sync {
    /// Fields that may need truncation
    fn fields(&self) -> &[FieldSpec];

    /// Names of the size-sensitive fields
    fn size_sensitive_fields(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.name).collect()
    }

    /// Truncate every oversized size-sensitive field in place.
    ///
    /// Returns the number of fields changed.
    fn truncate(&self, record: &mut Record, policy: &TruncationConfig) -> usize {
        self.fields()
            .iter()
            .filter(|field| {
                record
                    .get_mut(field.name)
                    .is_some_and(|value| truncate_value(value, field.kind, policy))
            })
            .count()
    }

    /// Append the record's wire form to `out`
    fn serialize(&self, record: &Record, out: &mut Vec<u8>) -> serde_json::Result<()> {
        serde_json::to_writer(out, record)
    }
}

/// `RecordCodec` driven by a static field list
#[derive(Debug)]
pub struct FieldCodec {
    fields: &'static [FieldSpec],
}

impl FieldCodec {
    /// Create a codec for the given fields
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }
}

impl RecordCodec for FieldCodec {
    fn fields(&self) -> &[FieldSpec] {
        self.fields
    }
}

/// Truncate a string if it exceeds the threshold
pub fn truncate_str(s: &str, policy: &TruncationConfig) -> Option<String> {
    if s.len() <= policy.threshold {
        return None;
    }

    let mut end = policy.prefix_length.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }

    let mut truncated = String::with_capacity(end + policy.marker.len());
    truncated.push_str(&s[..end]);
    truncated.push_str(&policy.marker);
    Some(truncated)
}

/// Truncate a field value according to its kind; returns whether it changed
fn truncate_value(value: &mut Value, kind: FieldKind, policy: &TruncationConfig) -> bool {
    match (kind, value) {
        (_, Value::String(s)) => replace_if_truncated(s, policy),
        (FieldKind::Map, Value::Object(map)) => {
            let mut changed = false;
            for entry in map.values_mut() {
                if let Value::String(s) = entry {
                    changed |= replace_if_truncated(s, policy);
                }
            }
            changed
        }
        (FieldKind::Json, value) if value.is_object() || value.is_array() => {
            let serialized = value.to_string();
            match truncate_str(&serialized, policy) {
                Some(truncated) => {
                    *value = Value::String(truncated);
                    true
                }
                None => false,
            }
        }
        _ => false,
    }
}

fn replace_if_truncated(s: &mut String, policy: &TruncationConfig) -> bool {
    match truncate_str(s, policy) {
        Some(truncated) => {
            *s = truncated;
            true
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

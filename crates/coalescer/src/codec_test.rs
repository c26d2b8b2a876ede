//! Tests for record codecs and truncation

use serde_json::json;
use spool_config::TruncationConfig;

use super::*;
use crate::destination::Destination;

fn policy() -> TruncationConfig {
    TruncationConfig {
        threshold: 64,
        prefix_length: 16,
        marker: "[TRUNCATED]".into(),
    }
}

fn long(n: usize) -> String {
    "x".repeat(n)
}

#[test]
fn test_truncate_str_under_threshold() {
    assert!(truncate_str("short", &policy()).is_none());
    assert!(truncate_str(&long(64), &policy()).is_none());
}

#[test]
fn test_truncate_str_over_threshold() {
    let truncated = truncate_str(&long(65), &policy()).unwrap();
    assert_eq!(truncated, format!("{}[TRUNCATED]", long(16)));
    assert!(truncated.len() <= policy().threshold);
}

#[test]
fn test_truncate_str_char_boundary() {
    // 'é' is two bytes; byte 16 falls inside the 9th character
    let s = format!("a{}", "é".repeat(40));
    let truncated = truncate_str(&s, &policy()).unwrap();
    let prefix = truncated.strip_suffix("[TRUNCATED]").unwrap();
    assert_eq!(prefix.len(), 15);
    assert!(prefix.chars().all(|c| c == 'a' || c == 'é'));
}

#[test]
fn test_truncate_text_and_json_fields() {
    let codec = Destination::Traces.codec();
    let mut record = Record::new()
        .with("id", "t-1")
        .with("input", long(500))
        .with("output", "ok");

    let changed = codec.truncate(&mut record, &policy());
    assert_eq!(changed, 1);

    let input = record.get("input").unwrap().as_str().unwrap();
    assert!(input.ends_with("[TRUNCATED]"));
    assert!(input.len() <= policy().threshold);
    assert_eq!(record.get("output").unwrap(), "ok");
    assert_eq!(record.get("id").unwrap(), "t-1");
}

#[test]
fn test_truncate_json_object_value() {
    let codec = Destination::Observations.codec();
    let mut record = Record::new().with("output", json!({"messages": [long(200)]}));

    assert_eq!(codec.truncate(&mut record, &policy()), 1);
    let output = record.get("output").unwrap().as_str().unwrap();
    assert!(output.starts_with("{\"messages\""));
    assert!(output.ends_with("[TRUNCATED]"));
}

#[test]
fn test_truncate_map_entries_individually() {
    let codec = Destination::Scores.codec();
    let mut record = Record::new().with(
        "metadata",
        json!({"small": "keep", "big": long(100), "count": 3}),
    );

    assert_eq!(codec.truncate(&mut record, &policy()), 1);
    let metadata = record.get("metadata").unwrap();
    assert_eq!(metadata["small"], "keep");
    assert_eq!(metadata["count"], 3);
    assert!(metadata["big"].as_str().unwrap().ends_with("[TRUNCATED]"));
}

#[test]
fn test_truncate_is_idempotent() {
    let codec = Destination::Traces.codec();
    let mut record = Record::new()
        .with("input", long(500))
        .with("metadata", json!({"k": long(500)}));

    assert_eq!(codec.truncate(&mut record, &policy()), 2);
    let once = record.clone();
    assert_eq!(codec.truncate(&mut record, &policy()), 0);
    assert_eq!(record, once);
}

#[test]
fn test_non_sensitive_fields_untouched() {
    let codec = Destination::BlobStorageFileLog.codec();
    let mut record = Record::new().with("bucket_path", long(500));

    assert_eq!(codec.truncate(&mut record, &policy()), 0);
    assert_eq!(record.get("bucket_path").unwrap().as_str().unwrap().len(), 500);
}

#[test]
fn test_serialize_appends() {
    let codec = Destination::Scores.codec();
    let mut out = b"prefix:".to_vec();
    codec
        .serialize(&Record::new().with("id", "s-1"), &mut out)
        .unwrap();
    assert_eq!(out, b"prefix:{\"id\":\"s-1\"}");
}

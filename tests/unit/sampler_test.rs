//! Tests for the JSON sampler.
//!
//! Covers both strategies: whole-file parsing for small files and the
//! incremental scanner for large ones.

use std::fmt::Write as _;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use toolbench::sampler::{sample_json, SampleMode};
use toolbench::types::config::SamplerConfig;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// An array of `count` records, each roughly 120 bytes.
fn records_json(count: usize) -> String {
    let mut out = String::from("[\n");
    for i in 0..count {
        if i > 0 {
            out.push_str(",\n");
        }
        write!(
            out,
            r#"  {{"id": {i}, "Product": "item-{i}", "Net": "{i}.50", "note": "padding padding padding padding padding"}}"#
        )
        .unwrap();
    }
    out.push_str("\n]\n");
    out
}

// ============================================================================
// Small files
// ============================================================================

#[tokio::test]
async fn test_small_array_exact_count_and_fields() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.json", r#"[{"a": 1}, {"b": 2}, {"a": 3, "c": 4}, {"d": 5}]"#);

    let config = SamplerConfig {
        max_records: 3,
        ..SamplerConfig::default()
    };
    let sample = sample_json(&path, &config).await;

    assert!(sample.is_ok());
    assert_eq!(sample.mode, SampleMode::Full);
    assert_eq!(sample.record_count, 4);
    assert!(!sample.record_count_estimated);
    assert_eq!(sample.records.len(), 3);
    let fields: Vec<_> = sample.fields.iter().map(String::as_str).collect();
    assert_eq!(fields, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_small_top_level_object_is_one_record() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "obj.json", r#"{"store": "North", "open": true}"#);

    let sample = sample_json(&path, &SamplerConfig::default()).await;
    assert_eq!(sample.record_count, 1);
    assert_eq!(sample.records, vec![json!({"store": "North", "open": true})]);
}

#[tokio::test]
async fn test_small_invalid_json_reports_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.json", "[{\"a\": ");

    let sample = sample_json(&path, &SamplerConfig::default()).await;
    assert!(!sample.is_ok());
    assert!(sample.error.unwrap().starts_with("Invalid JSON"));
}

#[tokio::test]
async fn test_missing_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let sample = sample_json(&dir.path().join("nope.json"), &SamplerConfig::default()).await;
    assert!(!sample.is_ok());
    assert!(sample.records.is_empty());
}

// ============================================================================
// Large files
// ============================================================================

#[tokio::test]
async fn test_large_file_stops_at_max_records() {
    let dir = TempDir::new().unwrap();
    let content = records_json(60_000);
    assert!(content.len() as u64 > SamplerConfig::default().small_file_threshold);
    let path = write(&dir, "big.json", &content);

    let config = SamplerConfig {
        max_records: 10,
        ..SamplerConfig::default()
    };
    let sample = sample_json(&path, &config).await;

    assert!(sample.is_ok());
    assert_eq!(sample.mode, SampleMode::Streaming);
    assert_eq!(sample.records.len(), 10);
    assert_eq!(sample.records[0]["id"], 0);
    assert_eq!(sample.records[9]["id"], 9);
    assert!(sample.record_count_estimated);
    assert!(sample.record_count > 10);
    assert!(sample.fields.contains("Product"));
}

#[tokio::test]
async fn test_streaming_read_to_end_is_exact() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "few.json", &records_json(3));

    let config = SamplerConfig {
        small_file_threshold: 0,
        max_records: 10,
    };
    let sample = sample_json(&path, &config).await;

    assert_eq!(sample.mode, SampleMode::Streaming);
    assert_eq!(sample.records.len(), 3);
    assert_eq!(sample.record_count, 3);
    assert!(!sample.record_count_estimated);
}

#[tokio::test]
async fn test_streaming_ignores_braces_inside_strings() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "tricky.json",
        r#"[{"name": "a } { b", "q": "say \"}\""}, {"name": "plain"}]"#,
    );

    let config = SamplerConfig {
        small_file_threshold: 0,
        max_records: 5,
    };
    let sample = sample_json(&path, &config).await;

    assert_eq!(
        sample.records,
        vec![json!({"name": "a } { b", "q": "say \"}\""}), json!({"name": "plain"})]
    );
}

#[tokio::test]
async fn test_sample_serializes_camel_case() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.json", "[]");

    let value = serde_json::to_value(sample_json(&path, &SamplerConfig::default()).await).unwrap();
    assert_eq!(value["recordCount"], 0);
    assert_eq!(value["recordCountEstimated"], false);
    assert_eq!(value["mode"], "full");
    assert!(value.get("error").is_none());
}

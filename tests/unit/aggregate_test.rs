//! Tests for the aggregation engine: coercion, file selection and totals.

use std::collections::BTreeMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use toolbench::aggregate::{
    coerce_number, discover_json_files, group_key, select_files, AggregateMode, AggregateRequest,
    AggregationEngine, MISSING_KEY,
};

fn request(fields: &[&str], top_n: usize) -> AggregateRequest {
    AggregateRequest {
        group_by: "Product".to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
        top_n,
        mode: AggregateMode::Auto,
    }
}

fn write_json(dir: &TempDir, rel: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path
}

// ============================================================================
// Coercion
// ============================================================================

#[test]
fn test_coerce_currency_strings() {
    assert_eq!(coerce_number(&json!("$1,234.50")), Some(1234.5));
    assert_eq!(coerce_number(&json!("-3")), Some(-3.0));
    assert_eq!(coerce_number(&json!(7)), Some(7.0));
    assert_eq!(coerce_number(&json!("n/a")), None);
    assert_eq!(coerce_number(&json!(null)), None);
    assert_eq!(coerce_number(&json!(true)), None);
}

#[test]
fn test_group_key_forms() {
    assert_eq!(group_key(Some(&json!("Tea"))), "Tea");
    assert_eq!(group_key(Some(&json!(42))), "42");
    assert_eq!(group_key(Some(&json!(null))), MISSING_KEY);
    assert_eq!(group_key(None), MISSING_KEY);
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_auto_selection_prefers_one_export_per_directory() {
    let files: Vec<PathBuf> = [
        "a/Sales by Product per Day.json",
        "a/Sales by Classification.json",
        "b/Sales by Product.json",
        "b/Sales by Product with Location.json",
        "c/misc.json",
        "c/other.json",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();

    let selected = select_files(files, AggregateMode::Auto);
    assert_eq!(
        selected,
        vec![
            PathBuf::from("a/Sales by Classification.json"),
            PathBuf::from("b/Sales by Product.json"),
            PathBuf::from("c/misc.json"),
            PathBuf::from("c/other.json"),
        ]
    );
}

#[test]
fn test_explicit_modes_filter_by_name() {
    let files: Vec<PathBuf> = ["x/Invoice Report.json", "x/Itemized Sales.json", "x/Sales by Product.json"]
        .iter()
        .map(PathBuf::from)
        .collect();

    assert_eq!(
        select_files(files.clone(), AggregateMode::Invoice),
        vec![PathBuf::from("x/Invoice Report.json")]
    );
    assert_eq!(
        select_files(files, AggregateMode::Itemized),
        vec![PathBuf::from("x/Itemized Sales.json")]
    );
}

#[test]
fn test_mode_parsing() {
    assert_eq!("daily".parse::<AggregateMode>().unwrap(), AggregateMode::Daily);
    assert!("weekly".parse::<AggregateMode>().unwrap_err().is_validation());
}

#[test]
fn test_discovery_skips_hidden_and_non_json() {
    let dir = TempDir::new().unwrap();
    write_json(&dir, "b.json", &json!([]));
    write_json(&dir, "a/c.json", &json!([]));
    write_json(&dir, ".cache/d.json", &json!([]));
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

    let found = discover_json_files(dir.path()).unwrap();
    let rel: Vec<_> = found
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(rel, vec!["a/c.json", "b.json"]);

    assert!(discover_json_files(&dir.path().join("missing")).is_err());
}

// ============================================================================
// Engine
// ============================================================================

#[tokio::test]
async fn test_top_n_does_not_change_totals() {
    let dir = TempDir::new().unwrap();
    write_json(
        &dir,
        "sales.json",
        &json!([
            {"Product": "Tea", "Net": "5"},
            {"Product": "Cake", "Net": "3"},
            {"Product": "Pie", "Net": "2"},
            {"Net": "1"}
        ]),
    );

    let engine = AggregationEngine::new(4);
    let all = engine.aggregate(dir.path(), &request(&["Net"], 20)).await.unwrap();
    let top = engine.aggregate(dir.path(), &request(&["Net"], 1)).await.unwrap();

    assert_eq!(all.totals, top.totals);
    assert_eq!(top.totals["Net"], 11.0);
    assert_eq!(top.groups.len(), 1);
    assert_eq!(top.groups[0].key, "Tea");
    assert_eq!(top.group_count, 4);
    assert!(all.groups.iter().any(|g| g.key == MISSING_KEY));
}

#[tokio::test]
async fn test_ranking_without_fields_uses_count() {
    let dir = TempDir::new().unwrap();
    write_json(
        &dir,
        "sales.json",
        &json!([
            {"Product": "B"}, {"Product": "A"}, {"Product": "B"}, {"Product": "C"}, {"Product": "A"}
        ]),
    );

    let report = AggregationEngine::new(2)
        .aggregate(dir.path(), &request(&[], 10))
        .await
        .unwrap();
    let keys: Vec<_> = report.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["A", "B", "C"]);
    assert_eq!(report.chart[0].value, 2.0);
    assert!(report.totals.is_empty());
}

#[tokio::test]
async fn test_unparseable_files_are_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    write_json(&dir, "good.json", &json!([{"Product": "Tea", "Net": 1}]));
    std::fs::write(dir.path().join("bad.json"), "[{").unwrap();
    write_json(&dir, "object.json", &json!({"Product": "Tea"}));

    let report = AggregationEngine::new(10)
        .aggregate(dir.path(), &request(&["Net"], 10))
        .await
        .unwrap();

    assert_eq!(report.files_used, vec!["good.json"]);
    let errors: BTreeMap<_, _> = report
        .file_errors
        .iter()
        .map(|e| (e.file.as_str(), e.error.as_str()))
        .collect();
    assert!(errors["bad.json"].starts_with("Invalid JSON"));
    assert_eq!(errors["object.json"], "Expected a JSON array of records");
    assert_eq!(report.total_records, 1);
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = AggregationEngine::new(1)
        .aggregate(&dir.path().join("nope"), &request(&["Net"], 5))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_report_serializes_camel_case() {
    let dir = TempDir::new().unwrap();
    write_json(&dir, "s.json", &json!([{"Product": "Tea", "Net": 2}]));

    let report = AggregationEngine::new(1)
        .aggregate(dir.path(), &request(&["Net"], 5))
        .await
        .unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["groupBy"], "Product");
    assert_eq!(value["mode"], "auto");
    assert_eq!(value["totalRecords"], 1);
    assert_eq!(value["groups"][0]["sums"]["Net"], 2.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_totals_equal_sum_of_all_records(
        records in prop::collection::vec((0u8..6, -1000i32..1000), 0..60),
        top_n in 0usize..4,
    ) {
        let dir = TempDir::new().unwrap();
        let rows: Vec<Value> = records
            .iter()
            .map(|(key, net)| json!({"Product": format!("p{key}"), "Net": net}))
            .collect();
        write_json(&dir, "data.json", &Value::Array(rows));

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let report = runtime
            .block_on(AggregationEngine::new(3).aggregate(dir.path(), &request(&["Net"], top_n)))
            .unwrap();

        let expected: i64 = records.iter().map(|(_, net)| i64::from(*net)).sum();
        prop_assert_eq!(report.totals["Net"], expected as f64);
        prop_assert_eq!(report.total_records, records.len() as u64);
        prop_assert!(report.groups.len() <= top_n);
        prop_assert!(report.groups.len() <= report.group_count);
        let counted: u64 = report.groups.iter().map(|g| g.count).sum();
        prop_assert!(counted <= report.total_records);
    }
}

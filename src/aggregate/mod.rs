//! Grouped sums over JSON export files.
//!
//! [`AggregationEngine`] discovers the `.json` files under a root, picks the
//! ones to use (see [`selection`]), parses them in fixed-width batches, and
//! groups every object record by one field while summing a set of numeric
//! fields.
//!
//! Each file produces its own tally; tallies are merged only after a batch
//! completes, so the result does not depend on completion order. Totals are
//! computed over every group before the ranking is truncated to `top_n`.

pub mod coerce;
pub mod selection;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ToolError, ToolOutcome};
use crate::parallel::BatchExecutor;
use crate::types::config::AggregateConfig;

pub use coerce::{coerce_number, group_key, MISSING_KEY};
pub use selection::{discover_json_files, select_files, AggregateMode};

/// Number of entries in [`AggregateReport::chart`].
pub const CHART_POINTS: usize = 10;

/// What to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    /// Field whose value keys the groups.
    pub group_by: String,
    /// Numeric fields to sum. The first one ranks the groups.
    pub fields: Vec<String>,
    /// Number of groups returned.
    pub top_n: usize,
    /// File selection mode.
    pub mode: AggregateMode,
}

impl AggregateRequest {
    /// A request using the configured defaults.
    #[must_use]
    pub fn from_config(config: &AggregateConfig) -> Self {
        Self {
            group_by: config.group_by.clone(),
            fields: Vec::new(),
            top_n: config.top_n,
            mode: AggregateMode::Auto,
        }
    }
}

/// One ranked group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationGroup {
    pub key: String,
    pub count: u64,
    pub sums: BTreeMap<String, f64>,
}

/// One bar of the chart projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// A file that could not be aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// Result of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub group_by: String,
    pub fields: Vec<String>,
    pub mode: AggregateMode,
    /// Top `top_n` groups, ranked.
    pub groups: Vec<AggregationGroup>,
    /// Sum of each field over all groups, not just the returned ones.
    pub totals: BTreeMap<String, f64>,
    pub group_count: usize,
    pub total_records: u64,
    pub files_used: Vec<String>,
    pub file_errors: Vec<FileError>,
    pub chart: Vec<ChartPoint>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct GroupAcc {
    count: u64,
    sums: BTreeMap<String, f64>,
}

/// Partial result for one file.
#[derive(Debug, Default)]
struct Tally {
    groups: BTreeMap<String, GroupAcc>,
    records: u64,
}

impl Tally {
    fn add_record(&mut self, record: &serde_json::Map<String, Value>, group_by: &str, fields: &[String]) {
        let key = group_key(record.get(group_by));
        let group = self.groups.entry(key).or_insert_with(|| GroupAcc {
            count: 0,
            sums: fields.iter().map(|f| (f.clone(), 0.0)).collect(),
        });
        group.count += 1;
        for field in fields {
            if let Some(n) = record.get(field).and_then(coerce_number) {
                *group.sums.entry(field.clone()).or_insert(0.0) += n;
            }
        }
        self.records += 1;
    }

    fn merge(&mut self, other: Tally) {
        self.records += other.records;
        for (key, acc) in other.groups {
            let group = self.groups.entry(key).or_default();
            group.count += acc.count;
            for (field, value) in acc.sums {
                *group.sums.entry(field).or_insert(0.0) += value;
            }
        }
    }
}

/// Runs aggregations with bounded file concurrency.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationEngine {
    executor: BatchExecutor,
}

impl AggregationEngine {
    /// Creates an engine parsing `batch_width` files at a time.
    #[must_use]
    pub fn new(batch_width: usize) -> Self {
        Self {
            executor: BatchExecutor::new(batch_width),
        }
    }

    /// Discovers, selects and aggregates the files under `root`.
    ///
    /// # Errors
    ///
    /// Fails only if `root` cannot be read. Per-file failures are reported in
    /// [`AggregateReport::file_errors`].
    pub async fn aggregate(&self, root: &Path, request: &AggregateRequest) -> ToolOutcome<AggregateReport> {
        let owned_root = root.to_path_buf();
        let discovered = tokio::task::spawn_blocking(move || discover_json_files(&owned_root)).await??;
        let found = discovered.len();
        let selected = select_files(discovered, request.mode);

        debug!(
            root = %root.display(),
            found,
            selected = selected.len(),
            mode = %request.mode,
            "Selected files for aggregation"
        );

        Ok(self.aggregate_files(root, selected, request).await)
    }

    /// Aggregates exactly `files`, with no discovery or selection.
    ///
    /// File names in the report are shown relative to `root` when possible.
    pub async fn aggregate_files(
        &self,
        root: &Path,
        files: Vec<PathBuf>,
        request: &AggregateRequest,
    ) -> AggregateReport {
        let started = Instant::now();
        let group_by = request.group_by.as_str();
        let fields = request.fields.as_slice();

        let tallies = self
            .executor
            .run(files.clone(), |path| async move { tally_file(&path, group_by, fields).await })
            .await;

        let mut total = Tally::default();
        let mut files_used = Vec::new();
        let mut file_errors = Vec::new();
        for (path, tally) in files.iter().zip(tallies) {
            let name = display_name(root, path);
            match tally {
                Ok(tally) => {
                    total.merge(tally);
                    files_used.push(name);
                }
                Err(error) => {
                    warn!(file = %name, error = %error, "Skipping file in aggregation");
                    file_errors.push(FileError { file: name, error });
                }
            }
        }

        let totals = request
            .fields
            .iter()
            .map(|field| {
                let sum = total
                    .groups
                    .values()
                    .filter_map(|g| g.sums.get(field))
                    .sum::<f64>();
                (field.clone(), sum)
            })
            .collect();

        let group_count = total.groups.len();
        let ranked = rank(total.groups, request.fields.first().map(String::as_str));

        let chart = ranked
            .iter()
            .take(CHART_POINTS)
            .map(|g| ChartPoint {
                label: g.key.clone(),
                value: ranking_value(g, request.fields.first().map(String::as_str)),
            })
            .collect();

        let groups = ranked.into_iter().take(request.top_n).collect();

        let report = AggregateReport {
            group_by: request.group_by.clone(),
            fields: request.fields.clone(),
            mode: request.mode,
            groups,
            totals,
            group_count,
            total_records: total.records,
            files_used,
            file_errors,
            chart,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            files = report.files_used.len(),
            errors = report.file_errors.len(),
            groups = report.group_count,
            records = report.total_records,
            elapsed_ms = report.processing_time_ms,
            "Aggregation complete"
        );

        report
    }
}

async fn tally_file(path: &Path, group_by: &str, fields: &[String]) -> Result<Tally, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ToolError::from_io(path, &e).to_string())?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| format!("Invalid JSON: {e}"))?;
    let Value::Array(records) = value else {
        return Err("Expected a JSON array of records".to_string());
    };

    let mut tally = Tally::default();
    for record in records.iter().filter_map(Value::as_object) {
        tally.add_record(record, group_by, fields);
    }
    Ok(tally)
}

fn ranking_value(group: &AggregationGroup, by: Option<&str>) -> f64 {
    match by {
        Some(field) => group.sums.get(field).copied().unwrap_or(0.0),
        None => group.count as f64,
    }
}

/// Orders groups descending by the ranking field (or count), ties by key.
fn rank(groups: BTreeMap<String, GroupAcc>, by: Option<&str>) -> Vec<AggregationGroup> {
    let mut ranked: Vec<AggregationGroup> = groups
        .into_iter()
        .map(|(key, acc)| AggregationGroup {
            key,
            count: acc.count,
            sums: acc.sums,
        })
        .collect();

    ranked.sort_by(|a, b| {
        let order = match by {
            Some(_) => ranking_value(b, by).total_cmp(&ranking_value(a, by)),
            None => b.count.cmp(&a.count),
        };
        if order == Ordering::Equal {
            a.key.cmp(&b.key)
        } else {
            order
        }
    });
    ranked
}

fn display_name(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
    }
}

//! Bounded-memory sampling of JSON files.
//!
//! Files below [`SamplerConfig::small_file_threshold`] are parsed in full and
//! report an exact record count. Larger files are read incrementally by
//! [`streaming::RecordScanner`], which stops as soon as `max_records` objects
//! have been extracted.
//!
//! The record count reported for a large file that was not read to the end
//! is an extrapolation from bytes-per-record; `recordCountEstimated` is set in
//! that case. Do not feed it into any total that must be exact.

mod streaming;

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::types::config::SamplerConfig;
use streaming::RecordScanner;

/// Read size for large-file mode.
const CHUNK_SIZE: usize = 64 * 1024;

/// Which strategy produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Whole file parsed; counts are exact.
    #[default]
    Full,
    /// Incremental scan; counts may be estimated.
    Streaming,
}

/// A bounded sample of a JSON file's records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSample {
    /// At most `max_records` records, in file order.
    pub records: Vec<Value>,
    /// File size in bytes.
    pub total_size: u64,
    /// Union of the keys of the sampled records.
    pub fields: BTreeSet<String>,
    /// Number of records in the file (see `record_count_estimated`).
    pub record_count: u64,
    /// `true` when `record_count` is an extrapolation, not a count.
    pub record_count_estimated: bool,
    /// Strategy used.
    pub mode: SampleMode,
    /// Why sampling failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonSample {
    fn failed(total_size: u64, error: impl Into<String>) -> Self {
        Self {
            total_size,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the sample was produced without error.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Samples the records of the JSON file at `path`.
///
/// Never fails: I/O and parse errors are reported in [`JsonSample::error`].
pub async fn sample_json(path: &Path, config: &SamplerConfig) -> JsonSample {
    let total_size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot stat JSON file");
            return JsonSample::failed(0, format!("Failed to read {}: {e}", path.display()));
        }
    };

    if total_size < config.small_file_threshold {
        sample_small(path, total_size, config.max_records).await
    } else {
        sample_streaming(path, total_size, config.max_records).await
    }
}

async fn sample_small(path: &Path, total_size: u64, max_records: usize) -> JsonSample {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => return JsonSample::failed(total_size, format!("Failed to read {}: {e}", path.display())),
    };

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => return JsonSample::failed(total_size, format!("Invalid JSON: {e}")),
    };

    let (records, record_count) = match value {
        Value::Array(items) => {
            let count = items.len() as u64;
            (items.into_iter().take(max_records).collect::<Vec<_>>(), count)
        }
        other => (vec![other], 1),
    };

    let fields = records
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|map| map.keys().cloned())
        .collect();

    JsonSample {
        records,
        total_size,
        fields,
        record_count,
        record_count_estimated: false,
        mode: SampleMode::Full,
        error: None,
    }
}

async fn sample_streaming(path: &Path, total_size: u64, max_records: usize) -> JsonSample {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) => return JsonSample::failed(total_size, format!("Failed to open {}: {e}", path.display())),
    };

    let mut scanner = RecordScanner::new(max_records);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut reached_eof = false;

    while !scanner.is_done() {
        match file.read(&mut buf).await {
            Ok(0) => {
                reached_eof = true;
                break;
            }
            Ok(n) => scanner.feed(&buf[..n]),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Read failed while streaming JSON");
                return JsonSample::failed(total_size, format!("Read error: {e}"));
            }
        }
    }

    let exact = reached_eof || scanner.array_closed();
    let skipped = scanner.skipped();
    let estimate = scanner.estimate_total(total_size);
    let (records, fields) = scanner.into_parts();
    let record_count = if exact { records.len() as u64 } else { estimate };

    debug!(
        path = %path.display(),
        sampled = records.len(),
        skipped,
        record_count,
        estimated = !exact,
        "Streamed JSON sample"
    );

    JsonSample {
        records,
        total_size,
        fields,
        record_count,
        record_count_estimated: !exact,
        mode: SampleMode::Streaming,
        error: None,
    }
}

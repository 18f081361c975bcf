//! Batched file metadata collection.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::parallel::BatchExecutor;
use crate::util::format_timestamp;

/// Metadata for one path, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatRecord {
    /// The path as displayed.
    pub path: String,
    /// Size in bytes (0 on error).
    pub size: u64,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Last modification time, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
    /// Why the stat failed. Records with an error are excluded from totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileStatRecord {
    /// Whether the stat succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Stats files `width` at a time.
///
/// Within a batch every `stat` runs concurrently; batches run in sequence,
/// so at most `width` metadata calls are in flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelStatBatcher {
    executor: BatchExecutor,
}

impl ParallelStatBatcher {
    /// Creates a batcher with the given batch width.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            executor: BatchExecutor::new(width),
        }
    }

    /// Returns the batch width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.executor.width()
    }

    /// Stats every path. One record per input path, in input order; failures
    /// are recorded in [`FileStatRecord::error`].
    pub async fn stat_all(&self, paths: Vec<PathBuf>) -> Vec<FileStatRecord> {
        self.executor.run(paths, stat_one).await
    }
}

async fn stat_one(path: PathBuf) -> FileStatRecord {
    let shown = path.to_string_lossy().into_owned();
    match tokio::fs::metadata(&path).await {
        Ok(meta) => FileStatRecord {
            path: shown,
            size: meta.len(),
            is_dir: meta.is_dir(),
            mtime: meta.modified().ok().map(format_timestamp),
            error: None,
        },
        Err(e) => {
            debug!(path = %shown, error = %e, "stat failed");
            FileStatRecord {
                path: shown,
                size: 0,
                is_dir: false,
                mtime: None,
                error: Some(e.to_string()),
            }
        }
    }
}

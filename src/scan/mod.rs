//! Concurrent, depth-bounded directory statistics.
//!
//! The walk skips dot-prefixed entries. At each level the files are stat'd in
//! fixed-width batches by [`ParallelStatBatcher`], and every subdirectory is
//! walked by its own future. Each directory future returns a private
//! [`Partial`]; the parent merges its children's partials only after they all
//! complete, so counters are never shared between concurrent units.
//!
//! Listings keep traversal order: a directory's own files first, then each
//! subdirectory's results in listing order.

pub mod stat;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ToolError, ToolOutcome};
use crate::sampler::{sample_json, JsonSample};
use crate::types::config::{EngineConfig, SamplerConfig};
use crate::util::{extension_key, is_hidden, is_json_file};

pub use stat::{FileStatRecord, ParallelStatBatcher};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Number of entries in [`DirectorySummary::largest_files`].
pub const LARGEST_FILES: usize = 10;

/// Options for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Deepest level walked; the root is depth 0.
    pub max_depth: usize,
    /// Sample the largest `.json` files.
    pub include_content: bool,
    /// Files stat'd concurrently per batch.
    pub stat_batch_width: usize,
    /// How many `.json` files to sample.
    pub json_summary_count: usize,
    /// Sampler settings for `include_content`.
    pub sampler: SamplerConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ScanOptions {
    /// Builds options from the engine defaults.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.scan.max_depth,
            include_content: false,
            stat_batch_width: config.scan.stat_batch_width,
            json_summary_count: config.scan.json_summary_count,
            sampler: config.sampler.clone(),
        }
    }
}

/// Per-extension totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub count: u64,
    pub size: u64,
}

/// File counts by size class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeHistogram {
    /// Under 100 KiB.
    pub small: u64,
    /// Under 1 MiB.
    pub medium: u64,
    /// Under 50 MiB.
    pub large: u64,
    /// 50 MiB and up.
    pub huge: u64,
}

impl SizeHistogram {
    fn record(&mut self, size: u64) {
        match size {
            s if s < 100 * KIB => self.small += 1,
            s if s < MIB => self.medium += 1,
            s if s < 50 * MIB => self.large += 1,
            _ => self.huge += 1,
        }
    }

    fn merge(&mut self, other: &Self) {
        self.small += other.small;
        self.medium += other.medium;
        self.large += other.large;
        self.huge += other.huge;
    }
}

/// Whether a scan error concerns a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// A path the walk could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanError {
    pub path: String,
    pub error: String,
    pub kind: EntryKind,
}

/// One of the largest files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargestFile {
    pub path: String,
    pub size: u64,
}

/// Statistics for a directory tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySummary {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
    pub dir_count: u64,
    pub files: Vec<FileStatRecord>,
    pub subdirs: Vec<String>,
    pub by_extension: BTreeMap<String, ExtensionStats>,
    pub by_size: SizeHistogram,
    pub largest_files: Vec<LargestFile>,
    pub json_summaries: BTreeMap<String, JsonSample>,
    pub errors: Vec<ScanError>,
    pub processing_time_ms: u64,
}

impl DirectorySummary {
    /// Number of file-level errors.
    #[must_use]
    pub fn file_error_count(&self) -> u64 {
        self.errors
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .count() as u64
    }
}

/// Results gathered by one directory future.
#[derive(Debug, Default)]
struct Partial {
    total_size: u64,
    file_count: u64,
    dir_count: u64,
    files: Vec<FileStatRecord>,
    subdirs: Vec<String>,
    by_extension: BTreeMap<String, ExtensionStats>,
    by_size: SizeHistogram,
    sizes: Vec<(u64, PathBuf)>,
    errors: Vec<ScanError>,
}

impl Partial {
    fn add_file(&mut self, path: PathBuf, record: FileStatRecord) {
        if let Some(error) = &record.error {
            self.errors.push(ScanError {
                path: record.path.clone(),
                error: error.clone(),
                kind: EntryKind::File,
            });
            return;
        }

        self.total_size += record.size;
        self.file_count += 1;
        let ext = self.by_extension.entry(extension_key(&path)).or_default();
        ext.count += 1;
        ext.size += record.size;
        self.by_size.record(record.size);
        self.sizes.push((record.size, path));
        self.files.push(record);
    }

    fn dir_error(&mut self, dir: &Path, error: &std::io::Error) {
        self.errors.push(ScanError {
            path: dir.to_string_lossy().into_owned(),
            error: error.to_string(),
            kind: EntryKind::Directory,
        });
    }

    fn merge(&mut self, other: Partial) {
        self.total_size += other.total_size;
        self.file_count += other.file_count;
        self.dir_count += other.dir_count;
        self.files.extend(other.files);
        self.subdirs.extend(other.subdirs);
        for (key, stats) in other.by_extension {
            let entry = self.by_extension.entry(key).or_default();
            entry.count += stats.count;
            entry.size += stats.size;
        }
        self.by_size.merge(&other.by_size);
        self.sizes.extend(other.sizes);
        self.errors.extend(other.errors);
    }
}

/// Walks a directory tree and summarizes it.
#[derive(Debug, Clone)]
pub struct DirectoryAnalyzer {
    options: ScanOptions,
    batcher: ParallelStatBatcher,
}

impl DirectoryAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        let batcher = ParallelStatBatcher::new(options.stat_batch_width);
        Self { options, batcher }
    }

    /// Returns the options in use.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans the tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails only if `root` itself cannot be inspected or is not a directory.
    /// Anything unreadable below the root is reported in
    /// [`DirectorySummary::errors`].
    pub async fn analyze(&self, root: &Path) -> ToolOutcome<DirectorySummary> {
        let started = Instant::now();

        let meta = tokio::fs::metadata(root)
            .await
            .map_err(|e| ToolError::from_io(root, &e))?;
        if !meta.is_dir() {
            return Err(ToolError::invalid(
                "path",
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut partial = self.walk(root.to_path_buf(), 0).await;

        partial
            .sizes
            .sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let json_summaries = if self.options.include_content {
            self.summarize_json(&partial.sizes).await
        } else {
            BTreeMap::new()
        };

        let largest_files = partial
            .sizes
            .iter()
            .take(LARGEST_FILES)
            .map(|(size, path)| LargestFile {
                path: path.to_string_lossy().into_owned(),
                size: *size,
            })
            .collect();

        let summary = DirectorySummary {
            path: root.to_string_lossy().into_owned(),
            total_size: partial.total_size,
            file_count: partial.file_count,
            dir_count: partial.dir_count,
            files: partial.files,
            subdirs: partial.subdirs,
            by_extension: partial.by_extension,
            by_size: partial.by_size,
            largest_files,
            json_summaries,
            errors: partial.errors,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            path = %summary.path,
            files = summary.file_count,
            dirs = summary.dir_count,
            errors = summary.errors.len(),
            elapsed_ms = summary.processing_time_ms,
            "Directory scan complete"
        );

        Ok(summary)
    }

    fn walk(&self, dir: PathBuf, depth: usize) -> BoxFuture<'_, Partial> {
        async move {
            let mut partial = Partial::default();

            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Cannot read directory");
                    partial.dir_error(&dir, &e);
                    return partial;
                }
            };

            let mut files = Vec::new();
            let mut subdirs = Vec::new();
            let mut linked_dirs = Vec::new();
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        if is_hidden(&entry.file_name().to_string_lossy()) {
                            continue;
                        }
                        let path = entry.path();
                        match entry.file_type().await {
                            Ok(t) if t.is_dir() => subdirs.push(path),
                            // Linked directories are counted but not entered, so
                            // link cycles cannot recurse.
                            Ok(t) if t.is_symlink() && is_dir_target(&path).await => {
                                linked_dirs.push(path);
                            }
                            _ => files.push(path),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        partial.dir_error(&dir, &e);
                        break;
                    }
                }
            }

            let records = self.batcher.stat_all(files.clone()).await;
            for (path, record) in files.into_iter().zip(records) {
                partial.add_file(path, record);
            }

            partial.dir_count += (subdirs.len() + linked_dirs.len()) as u64;
            partial.subdirs.extend(
                subdirs
                    .iter()
                    .chain(&linked_dirs)
                    .map(|d| d.to_string_lossy().into_owned()),
            );

            if depth < self.options.max_depth {
                let children =
                    join_all(subdirs.into_iter().map(|sub| self.walk(sub, depth + 1))).await;
                for child in children {
                    partial.merge(child);
                }
            }

            partial
        }
        .boxed()
    }

    async fn summarize_json(&self, sizes_desc: &[(u64, PathBuf)]) -> BTreeMap<String, JsonSample> {
        let targets: Vec<&PathBuf> = sizes_desc
            .iter()
            .map(|(_, path)| path)
            .filter(|path| is_json_file(path))
            .take(self.options.json_summary_count)
            .collect();

        let samples = join_all(
            targets
                .iter()
                .map(|path| sample_json(path, &self.options.sampler)),
        )
        .await;

        targets
            .into_iter()
            .zip(samples)
            .filter_map(|(path, sample)| {
                if sample.is_ok() {
                    Some((path.to_string_lossy().into_owned(), sample))
                } else {
                    debug!(path = %path.display(), "Omitting failed JSON summary");
                    None
                }
            })
            .collect()
    }
}

/// Whether `path` resolves to a directory. Dangling links do not.
async fn is_dir_target(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

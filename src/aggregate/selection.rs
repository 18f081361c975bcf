//! Choosing which export files feed an aggregation.
//!
//! Point-of-sale exports often contain the same sales several times over
//! ("Sales by Product", "Sales by Product per Day", ...). Summing all of them
//! would double-count, so `auto` mode keeps at most one preferred export per
//! directory.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ToolError, ToolOutcome};
use crate::util::{is_hidden, is_json_file};

/// How files are selected for aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateMode {
    /// One preferred export per directory.
    #[default]
    Auto,
    /// Plain "Sales by Product" exports.
    Product,
    /// Invoice exports.
    Invoice,
    /// Itemized exports.
    Itemized,
    /// Per-day exports.
    Daily,
}

impl AggregateMode {
    /// The wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Product => "product",
            Self::Invoice => "invoice",
            Self::Itemized => "itemized",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for AggregateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateMode {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "product" => Ok(Self::Product),
            "invoice" => Ok(Self::Invoice),
            "itemized" => Ok(Self::Itemized),
            "daily" => Ok(Self::Daily),
            _ => Err(ToolError::invalid(
                "mode",
                format!("expected auto, product, invoice, itemized or daily, got '{s}'"),
            )),
        }
    }
}

/// Lower-cased file name, used for pattern matching.
fn lower_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_plain_product(name: &str) -> bool {
    name.contains("sales by product") && !name.contains("per day") && !name.contains("location")
}

fn is_product_location(name: &str) -> bool {
    name.contains("sales by product") && name.contains("location")
}

fn is_classification(name: &str) -> bool {
    name.contains("sales by classification")
}

fn is_product_per_day(name: &str) -> bool {
    name.contains("sales by product") && name.contains("per day")
}

/// Auto-mode preference order, best first.
const PREFERENCE: [fn(&str) -> bool; 4] = [
    is_plain_product,
    is_product_location,
    is_classification,
    is_product_per_day,
];

fn matches_mode(mode: AggregateMode, name: &str) -> bool {
    match mode {
        AggregateMode::Auto => true,
        AggregateMode::Product => is_plain_product(name),
        AggregateMode::Invoice => name.contains("invoice"),
        AggregateMode::Itemized => name.contains("itemized"),
        AggregateMode::Daily => name.contains("per day"),
    }
}

/// Lists every `.json` file under `root`, skipping dot-prefixed entries.
///
/// A file root yields itself. Order is a name-sorted walk. Blocking; run it
/// on a blocking thread.
///
/// # Errors
///
/// Fails if `root` does not exist or cannot be read.
pub fn discover_json_files(root: &Path) -> ToolOutcome<Vec<PathBuf>> {
    let meta = std::fs::metadata(root).map_err(|e| ToolError::from_io(root, &e))?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(&entry.file_name().to_string_lossy()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry during discovery");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_json_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    Ok(files)
}

/// Applies `mode` to the discovered files.
///
/// In `auto` mode a single file is always kept. With several files, each
/// directory contributes only its most preferred export; a directory with no
/// recognized export keeps all of its files.
#[must_use]
pub fn select_files(files: Vec<PathBuf>, mode: AggregateMode) -> Vec<PathBuf> {
    if mode != AggregateMode::Auto {
        return files
            .into_iter()
            .filter(|path| matches_mode(mode, &lower_name(path)))
            .collect();
    }

    if files.len() <= 1 {
        return files;
    }

    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        by_dir.entry(dir).or_default().push(file);
    }

    let mut selected = Vec::new();
    for (dir, candidates) in by_dir {
        let preferred = PREFERENCE.iter().find_map(|matches| {
            candidates
                .iter()
                .find(|path| matches(&lower_name(path)))
                .cloned()
        });

        match preferred {
            Some(file) => {
                debug!(dir = %dir.display(), file = %file.display(), "Selected preferred export");
                selected.push(file);
            }
            // No recognized export here: every file is kept, so overlapping
            // reports in one directory are double-counted.
            None => selected.extend(candidates),
        }
    }
    selected
}

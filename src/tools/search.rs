//! In-process file search: Glob and Grep.
//!
//! Both walk the tree with `walkdir` on a blocking thread, in name-sorted
//! order, so results are deterministic. No shell is involved, so patterns are
//! never interpreted by anything but the glob and regex engines.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use walkdir::WalkDir;

use super::params::Params;
use crate::error::{ToolError, ToolOutcome};
use crate::types::{ToolContext, ToolResult};
use crate::util::is_hidden;

/// Default cap on Glob matches.
pub const DEFAULT_GLOB_LIMIT: usize = 100;

/// Default cap on Grep output entries.
pub const DEFAULT_GREP_LIMIT: usize = 250;

/// Bytes inspected for NUL when deciding a file is binary.
const BINARY_PROBE: usize = 8192;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Entry kind filter for Glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Dir,
}

impl FromStr for EntryType {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" | "file" => Ok(Self::File),
            "d" | "dir" | "directory" => Ok(Self::Dir),
            _ => Err(ToolError::invalid("type", format!("expected 'f' or 'd', got '{s}'"))),
        }
    }
}

/// A compiled Glob query.
#[derive(Debug, Clone)]
pub struct GlobQuery {
    prefix: PathBuf,
    pattern: Pattern,
    max_depth: usize,
    entry_type: Option<EntryType>,
    limit: usize,
}

impl GlobQuery {
    /// Compiles `pattern`.
    ///
    /// Leading components with no wildcard form a literal prefix that is
    /// joined onto the search root, so `/abs/dir/*.json` and `../x/*.json`
    /// search those directories. The rest is matched against paths relative
    /// to that directory, and `*` never crosses a `/`. A bare name pattern
    /// therefore matches only direct children; `**` recurses.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParameter`] for a malformed pattern.
    pub fn new(pattern: &str, entry_type: Option<EntryType>, limit: usize) -> ToolOutcome<Self> {
        let trimmed = pattern.trim_start_matches("./");
        let (prefix, rest) = split_literal_prefix(trimmed);
        let compiled = Pattern::new(rest).map_err(|e| ToolError::invalid("pattern", e.to_string()))?;
        let max_depth = if rest.contains("**") {
            usize::MAX
        } else {
            rest.split('/').filter(|c| !c.is_empty()).count().max(1)
        };
        Ok(Self {
            prefix,
            pattern: compiled,
            max_depth,
            entry_type,
            limit,
        })
    }

    fn accepts(&self, entry: &walkdir::DirEntry) -> bool {
        match self.entry_type {
            Some(EntryType::File) => entry.file_type().is_file(),
            Some(EntryType::Dir) => entry.file_type().is_dir(),
            None => true,
        }
    }

    /// Runs the query under `base`. Blocking.
    ///
    /// Returns the matching paths in walk order and whether the limit cut the
    /// result short. Paths are relative to `base` unless the pattern was
    /// absolute.
    pub fn run(&self, base: &Path) -> (Vec<String>, bool) {
        let mut matches = Vec::new();
        let root = base.join(&self.prefix);
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name();

        for entry in walker.into_iter().filter_map(Result::ok) {
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            if self.accepts(&entry) && self.pattern.matches_path_with(relative, MATCH_OPTIONS) {
                if matches.len() == self.limit {
                    return (matches, true);
                }
                matches.push(self.prefix.join(relative).to_string_lossy().into_owned());
            }
        }
        (matches, false)
    }
}

/// Splits `pattern` into its wildcard-free leading directories and the rest.
/// The final component always stays in the rest.
fn split_literal_prefix(pattern: &str) -> (PathBuf, &str) {
    let mut cut = 0;
    for (i, c) in pattern.char_indices() {
        match c {
            '*' | '?' | '[' => break,
            '/' => cut = i + 1,
            _ => {}
        }
    }
    let prefix = &pattern[..cut];
    let prefix = if prefix.len() > 1 { prefix.trim_end_matches('/') } else { prefix };
    (PathBuf::from(prefix), &pattern[cut..])
}

pub async fn glob(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let pattern = params.str("pattern")?;
    let base = params
        .opt_str("path")?
        .map_or_else(|| ctx.working_dir.clone(), |p| ctx.resolve(p));
    let entry_type = params.opt_str("type")?.map(str::parse).transpose()?;
    let limit = params.opt_usize("limit")?.unwrap_or(DEFAULT_GLOB_LIMIT);

    let query = GlobQuery::new(pattern, entry_type, limit)?;
    let meta = tokio::fs::metadata(&base)
        .await
        .map_err(|e| ToolError::from_io(&base, &e))?;
    if !meta.is_dir() {
        return Err(ToolError::invalid("path", format!("{} is not a directory", base.display())));
    }

    let walk_base = base.clone();
    let (matches, truncated) = tokio::task::spawn_blocking(move || query.run(&walk_base)).await?;

    debug!(pattern, base = %base.display(), count = matches.len(), truncated, "Glob complete");

    ToolResult::success(json!({
        "pattern": pattern,
        "base": base.to_string_lossy(),
        "count": matches.len(),
        "truncated": truncated,
        "matches": matches,
    }))
}

/// What Grep reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Matching lines with optional context.
    #[default]
    Content,
    /// Names of matching files.
    Files,
    /// Match counts per file.
    Count,
}

impl FromStr for OutputMode {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" => Ok(Self::Content),
            "files" | "files_with_matches" => Ok(Self::Files),
            "count" => Ok(Self::Count),
            _ => Err(ToolError::invalid(
                "output_mode",
                format!("expected content, files or count, got '{s}'"),
            )),
        }
    }
}

/// A compiled Grep query.
#[derive(Debug, Clone)]
pub struct GrepQuery {
    pub regex: Regex,
    pub file_filter: Option<Pattern>,
    pub before: usize,
    pub after: usize,
    pub mode: OutputMode,
    pub limit: usize,
}

/// Per-file match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub file: String,
    pub count: usize,
}

/// Result of a Grep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrepReport {
    pub mode: OutputMode,
    /// `content` mode output, grep-style (`file:line:text`, context as
    /// `file-line-text`, groups separated by `--`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<FileCount>>,
    pub total_matches: usize,
    pub files_matched: usize,
    pub truncated: bool,
}

impl GrepQuery {
    fn wants(&self, path: &Path) -> bool {
        match &self.file_filter {
            Some(filter) => path
                .file_name()
                .is_some_and(|name| filter.matches(&name.to_string_lossy())),
            None => true,
        }
    }

    fn candidates(&self, root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return vec![root.to_path_buf()];
        }
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && self.wants(e.path()))
            .map(walkdir::DirEntry::into_path)
            .collect()
    }

    /// Searches `root` (a file or directory). Blocking.
    pub fn run(&self, root: &Path) -> GrepReport {
        let mut report = GrepReport {
            mode: self.mode,
            ..GrepReport::default()
        };
        let mut output = String::new();
        let mut entries = 0usize;
        let mut files = Vec::new();
        let mut counts = Vec::new();

        for path in self.candidates(root) {
            let Some(text) = read_text_file(&path) else {
                continue;
            };
            let lines: Vec<&str> = text.lines().collect();
            let hits: Vec<usize> = lines
                .iter()
                .enumerate()
                .filter(|(_, line)| self.regex.is_match(line))
                .map(|(i, _)| i)
                .collect();
            if hits.is_empty() {
                continue;
            }

            let name = display_path(root, &path);
            report.total_matches += hits.len();
            report.files_matched += 1;

            if entries >= self.limit {
                report.truncated = true;
                continue;
            }

            match self.mode {
                OutputMode::Files => {
                    files.push(name);
                    entries += 1;
                }
                OutputMode::Count => {
                    counts.push(FileCount {
                        file: name,
                        count: hits.len(),
                    });
                    entries += 1;
                }
                OutputMode::Content => {
                    let budget = self.limit - entries;
                    let (written, cut) = self.render_content(&mut output, &name, &lines, &hits, budget);
                    entries += written;
                    report.truncated |= cut;
                }
            }
        }

        match self.mode {
            OutputMode::Content => report.output = Some(output),
            OutputMode::Files => report.files = Some(files),
            OutputMode::Count => report.counts = Some(counts),
        }
        report
    }

    /// Appends grep-style lines for one file. Returns the lines written and
    /// whether `budget` ran out.
    fn render_content(
        &self,
        out: &mut String,
        name: &str,
        lines: &[&str],
        hits: &[usize],
        budget: usize,
    ) -> (usize, bool) {
        let has_context = self.before > 0 || self.after > 0;
        let mut written = 0;
        let mut last_printed: Option<usize> = None;

        for &hit in hits {
            let start = hit.saturating_sub(self.before);
            let end = (hit + self.after).min(lines.len() - 1);
            let from = match last_printed {
                Some(last) if last + 1 >= start => last + 1,
                _ => {
                    if has_context && !out.is_empty() {
                        out.push_str("--\n");
                    }
                    start
                }
            };

            for i in from..=end {
                if written == budget {
                    return (written, true);
                }
                let sep = if hits.binary_search(&i).is_ok() { ':' } else { '-' };
                let _ = writeln!(out, "{name}{sep}{}{sep}{}", i + 1, lines[i]);
                written += 1;
                last_printed = Some(i);
            }
        }
        (written, false)
    }
}

fn read_text_file(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    if bytes[..bytes.len().min(BINARY_PROBE)].contains(&0) {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn display_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
        _ => path.to_string_lossy().into_owned(),
    }
}

pub async fn grep(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let pattern = params.str("pattern")?;
    let root = params
        .opt_str("path")?
        .map_or_else(|| ctx.working_dir.clone(), |p| ctx.resolve(p));
    let case_insensitive = params.bool_or("case_insensitive", false)?;
    let context = params.opt_usize("context")?.unwrap_or(0);
    let before = params.opt_usize("before")?.unwrap_or(context);
    let after = params.opt_usize("after")?.unwrap_or(context);
    let mode = params
        .opt_str("output_mode")?
        .map(str::parse)
        .transpose()?
        .unwrap_or_default();
    let limit = params.opt_usize("limit")?.unwrap_or(DEFAULT_GREP_LIMIT);
    let file_filter = params
        .opt_str("glob")?
        .map(Pattern::new)
        .transpose()
        .map_err(|e| ToolError::invalid("glob", e.to_string()))?;

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| ToolError::invalid("pattern", e.to_string()))?;

    tokio::fs::metadata(&root)
        .await
        .map_err(|e| ToolError::from_io(&root, &e))?;

    let query = GrepQuery {
        regex,
        file_filter,
        before,
        after,
        mode,
        limit,
    };
    let walk_root = root.clone();
    let report = tokio::task::spawn_blocking(move || query.run(&walk_root)).await?;

    debug!(
        pattern,
        root = %root.display(),
        matches = report.total_matches,
        files = report.files_matched,
        "Grep complete"
    );

    ToolResult::success(report)
}

//! File tools: Read, Write, Edit, LS and Multi.

use std::path::Path;

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::params::Params;
use crate::error::{ToolError, ToolOutcome};
use crate::types::{ToolContext, ToolResult};
use crate::util::{format_timestamp, is_hidden};

/// Most lines `Read` returns in one call.
pub const MAX_READ_LINES: usize = 2000;

/// Default per-file line cap for `Multi`.
pub const DEFAULT_MULTI_LINES: usize = 500;

async fn read_text(path: &Path) -> ToolOutcome<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ToolError::from_io(path, &e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Formats lines like `cat -n`, numbering from `first`.
fn number_lines<'a>(lines: impl Iterator<Item = &'a str>, first: usize) -> String {
    lines
        .enumerate()
        .map(|(i, line)| format!("{:>6}\t{line}", first + i))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn read(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let file_path = params.str("file_path")?;
    let offset = params
        .opt_i64("offset")?
        .map_or(1, |n| usize::try_from(n.max(1)).unwrap_or(usize::MAX));
    let limit = params
        .opt_usize("limit")?
        .unwrap_or(MAX_READ_LINES)
        .clamp(1, MAX_READ_LINES);

    let path = ctx.resolve(file_path);
    let text = read_text(&path).await?;
    let lines: Vec<&str> = text.lines().collect();
    let total_lines = lines.len();

    let start = (offset - 1).min(total_lines);
    let end = start.saturating_add(limit).min(total_lines);
    let content = number_lines(lines[start..end].iter().copied(), offset);

    debug!(path = %path.display(), offset, lines = end - start, total_lines, "Read file");

    ToolResult::success(json!({
        "file_path": path.to_string_lossy(),
        "content": content,
        "total_lines": total_lines,
        "offset": offset,
        "lines_returned": end - start,
    }))
}

pub async fn write(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let file_path = params.str("file_path")?;
    let content = params.str("content")?;

    let path = ctx.resolve(file_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ToolError::from_io(parent, &e))?;
    }
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| ToolError::from_io(&path, &e))?;

    debug!(path = %path.display(), bytes = content.len(), "Wrote file");

    ToolResult::success(json!({
        "file_path": path.to_string_lossy(),
        "bytes_written": content.len(),
    }))
}

/// Replaces `old_string` in `content`. Returns the new text and the number
/// of replacements, or `None` if `old_string` does not occur.
pub fn apply_edit(content: &str, old_string: &str, new_string: &str, replace_all: bool) -> Option<(String, usize)> {
    let occurrences = content.matches(old_string).count();
    if occurrences == 0 {
        return None;
    }
    if replace_all {
        Some((content.replace(old_string, new_string), occurrences))
    } else {
        Some((content.replacen(old_string, new_string, 1), 1))
    }
}

/// With `replace_all` unset only the first occurrence changes, even when
/// `old_string` is not unique.
pub async fn edit(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let file_path = params.str("file_path")?;
    let old_string = params.str("old_string")?;
    let new_string = params.str("new_string")?;
    let replace_all = params.bool_or("replace_all", false)?;
    if old_string.is_empty() {
        return Err(ToolError::invalid("old_string", "must not be empty"));
    }

    let path = ctx.resolve(file_path);
    let content = read_text(&path).await?;

    let (updated, replacements) = apply_edit(&content, old_string, new_string, replace_all)
        .ok_or_else(|| ToolError::StringNotFound {
            path: path.display().to_string(),
        })?;

    tokio::fs::write(&path, updated)
        .await
        .map_err(|e| ToolError::from_io(&path, &e))?;

    debug!(path = %path.display(), replacements, replace_all, "Edited file");

    ToolResult::success(json!({
        "file_path": path.to_string_lossy(),
        "replacements": replacements,
    }))
}

#[derive(Debug, Serialize)]
struct LsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtime: Option<String>,
}

pub async fn ls(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let dir = ctx.resolve(params.str("path")?);
    let all = params.bool_or("all", false)?;
    let long = params.bool_or("long", false)?;

    let mut reader = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| ToolError::from_io(&dir, &e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| ToolError::from_io(&dir, &e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !all && is_hidden(&name) {
            continue;
        }

        let kind = match entry.file_type().await {
            Ok(t) if t.is_dir() => "dir",
            Ok(t) if t.is_symlink() => "symlink",
            _ => "file",
        };

        let (size, mtime) = if long {
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) => (Some(meta.len()), meta.modified().ok().map(format_timestamp)),
                Err(e) => {
                    debug!(entry = %name, error = %e, "Omitting long fields");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        entries.push(LsEntry { name, kind, size, mtime });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    ToolResult::success(json!({
        "path": dir.to_string_lossy(),
        "count": entries.len(),
        "entries": entries,
    }))
}

#[derive(Debug, Serialize)]
struct MultiFile {
    path: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn read_truncated(ctx: &ToolContext, raw: String, max_lines: usize) -> MultiFile {
    let path = ctx.resolve(&raw);
    match read_text(&path).await {
        Ok(text) => {
            let total = text.lines().count();
            MultiFile {
                path: raw,
                success: true,
                content: Some(number_lines(text.lines().take(max_lines), 1)),
                total_lines: Some(total),
                truncated: Some(total > max_lines),
                error: None,
            }
        }
        Err(e) => MultiFile {
            path: raw,
            success: false,
            content: None,
            total_lines: None,
            truncated: None,
            error: Some(e.to_string()),
        },
    }
}

/// Reads every path concurrently. A failed file is reported in place and
/// does not fail the batch.
pub async fn multi(ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let paths = params.str_list("paths")?;
    let max_lines = params.opt_usize("max_lines")?.unwrap_or(DEFAULT_MULTI_LINES);

    let files = join_all(paths.into_iter().map(|p| read_truncated(ctx, p, max_lines))).await;
    let failed = files.iter().filter(|f| !f.success).count();

    debug!(files = files.len(), failed, "Multi read complete");

    ToolResult::success(json!({
        "count": files.len(),
        "failed": failed,
        "files": files,
    }))
}

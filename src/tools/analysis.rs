//! Data tools: Scan, Peek and Sum.
//!
//! Paths default to the store's data directory when the context carries one.

use std::path::PathBuf;

use serde_json::Value;

use super::params::Params;
use crate::aggregate::{AggregateMode, AggregateRequest, AggregationEngine};
use crate::error::{ToolError, ToolOutcome};
use crate::sampler::sample_json;
use crate::scan::{DirectoryAnalyzer, ScanOptions};
use crate::types::config::{EngineConfig, SamplerConfig};
use crate::types::{ToolContext, ToolResult};

fn data_path(ctx: &ToolContext, raw: Option<&str>) -> PathBuf {
    raw.map_or_else(|| ctx.data_root(), |p| ctx.resolve(p))
}

pub async fn scan(config: &EngineConfig, ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let root = data_path(ctx, params.opt_str("path")?);
    let mut options = ScanOptions::from_config(config);
    if let Some(depth) = params.opt_usize("max_depth")? {
        options.max_depth = depth;
    }
    options.include_content = params.bool_or("include_content", false)?;

    let summary = DirectoryAnalyzer::new(options).analyze(&root).await?;
    ToolResult::success(summary)
}

/// Reads the optional `group_by` / `fields` / `top_n` keys onto the
/// configured defaults.
fn aggregate_request(config: &EngineConfig, params: Params<'_>) -> ToolOutcome<AggregateRequest> {
    let mut request = AggregateRequest::from_config(&config.aggregate);
    if let Some(group_by) = params.opt_str("group_by")? {
        request.group_by = group_by.to_string();
    }
    if let Some(fields) = params.opt_str_list("fields")? {
        request.fields = fields;
    }
    if let Some(top_n) = params.opt_usize("top_n")? {
        request.top_n = top_n;
    }
    Ok(request)
}

pub async fn peek(config: &EngineConfig, ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let path = ctx.resolve(params.str("file_path")?);
    let sampler = SamplerConfig {
        max_records: params
            .opt_usize("max_records")?
            .unwrap_or(config.sampler.max_records),
        ..config.sampler.clone()
    };

    let request = match params.raw("aggregate") {
        None => None,
        Some(Value::Object(map)) => Some(aggregate_request(config, Params::new(map))?),
        Some(_) => return Err(ToolError::invalid("aggregate", "expected an object")),
    };

    tokio::fs::metadata(&path)
        .await
        .map_err(|e| ToolError::from_io(&path, &e))?;
    let sample = sample_json(&path, &sampler).await;
    if let Some(error) = &sample.error {
        return Err(ToolError::Io {
            path: path.display().to_string(),
            message: error.clone(),
        });
    }

    let mut result = ToolResult::success(&sample)?;
    if let Some(request) = request {
        let report = AggregationEngine::new(config.aggregate.batch_width)
            .aggregate_files(&path, vec![path.clone()], &request)
            .await;
        let value = serde_json::to_value(report)
            .map_err(|e| ToolError::internal(format!("failed to serialize aggregate: {e}")))?;
        result.payload.insert("aggregate".to_string(), value);
    }
    Ok(result)
}

pub async fn sum(config: &EngineConfig, ctx: &ToolContext, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let root = data_path(ctx, params.opt_str("path")?);
    let mut request = aggregate_request(config, params)?;
    if let Some(mode) = params.opt_str("mode")? {
        request.mode = mode.parse::<AggregateMode>()?;
    }

    let report = AggregationEngine::new(config.aggregate.batch_width)
        .aggregate(&root, &request)
        .await?;
    ToolResult::success(report)
}


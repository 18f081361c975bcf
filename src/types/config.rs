//! Configuration types for the tool engine.
//!
//! Two kinds of configuration flow into a [`ToolExecutor`](crate::tools::ToolExecutor):
//!
//! - [`EngineConfig`]: tunables loaded once from a TOML file (timeouts, batch
//!   widths, sampler thresholds). Every field has a default, so a missing file
//!   or a partial file is fine.
//! - [`ToolContext`]: the per-call context (working directory, current store).
//!   It is passed into every `execute` call as a plain value rather than kept
//!   in global state.
//!
//! # Examples
//!
//! ```
//! use toolbench::types::config::EngineConfig;
//!
//! let config: EngineConfig = toml::from_str(r#"
//!     [bash]
//!     default_timeout_ms = 30000
//! "#).unwrap();
//!
//! assert_eq!(config.bash.default_timeout_ms, 30_000);
//! assert_eq!(config.bash.max_timeout_ms, 600_000);
//! assert_eq!(config.scan.max_depth, 5);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Small-file threshold for the JSON sampler (5 MiB).
pub const DEFAULT_SMALL_FILE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Combined stdout + stderr capture limit for foreground commands (10 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Settings for the Bash tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BashConfig {
    /// Timeout applied when the invocation does not name one.
    pub default_timeout_ms: u64,
    /// Hard upper bound; larger requested timeouts are clamped to this.
    pub max_timeout_ms: u64,
    /// Combined stdout + stderr bytes retained per command.
    pub max_output_bytes: usize,
}

impl Default for BashConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 120_000,
            max_timeout_ms: 600_000,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Settings for the directory analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Default recursion limit when the invocation does not name one.
    pub max_depth: usize,
    /// Number of files stat'd concurrently per batch.
    pub stat_batch_width: usize,
    /// How many of the largest `.json` files get sampled with `include_content`.
    pub json_summary_count: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            stat_batch_width: 10,
            json_summary_count: 10,
        }
    }
}

/// Settings for the streaming JSON sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Files below this size are parsed in full.
    pub small_file_threshold: u64,
    /// Default sample size.
    pub max_records: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            small_file_threshold: DEFAULT_SMALL_FILE_THRESHOLD,
            max_records: 100,
        }
    }
}

/// Settings for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Number of files parsed concurrently per batch.
    pub batch_width: usize,
    /// Default ranking length.
    pub top_n: usize,
    /// Default group-by field.
    pub group_by: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            batch_width: 10,
            top_n: 20,
            group_by: "Product".to_string(),
        }
    }
}

/// Engine-wide tunables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bash tool settings.
    pub bash: BashConfig,
    /// Scan tool settings.
    pub scan: ScanConfig,
    /// JSON sampler settings.
    pub sampler: SamplerConfig,
    /// Sum tool settings.
    pub aggregate: AggregateConfig,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A file that does not exist yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Returns the default config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("dev", "toolbench", "toolbench")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// The store/location the agent is currently working against.
///
/// Owned by the caller (auth/session layer); the engine only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreContext {
    /// Opaque store identifier.
    pub id: Option<String>,
    /// Human-readable store name.
    pub name: Option<String>,
    /// Directory holding the store's exported data, used as the default root
    /// for Scan and Sum.
    pub data_dir: Option<PathBuf>,
}

/// Per-invocation context threaded into every tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    /// Base directory for relative paths and for Bash's default cwd.
    pub working_dir: PathBuf,
    /// Current store, if any.
    pub store: Option<StoreContext>,
}

impl ToolContext {
    /// Creates a context rooted at `working_dir` with no store.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            store: None,
        }
    }

    /// Attaches a store to this context.
    #[must_use]
    pub fn with_store(mut self, store: StoreContext) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolves a user-supplied path: absolute paths are kept, relative ones
    /// are joined onto the working directory.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_dir.join(candidate)
        }
    }

    /// Default root for data-oriented tools: the store's data directory when
    /// one is known, otherwise the working directory.
    #[must_use]
    pub fn data_root(&self) -> PathBuf {
        self.store
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .unwrap_or_else(|| self.working_dir.clone())
    }
}

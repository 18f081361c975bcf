//! toolbench - local tool-execution engine for a remote agent

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolbench::permissions::{ScriptedInput, SharedInput};
use toolbench::tools::{tool_definitions, ToolExecutor};
use toolbench::types::{EngineConfig, StoreContext, ToolContext, ToolUse};

#[derive(Parser, Debug)]
#[command(name = "toolbench")]
#[command(about = "Execute agent tool calls against the local machine")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Working directory for relative paths and shell commands
    #[arg(short = 'C', long, global = true, default_value = ".")]
    directory: PathBuf,

    /// Identifier of the current store
    #[arg(long, global = true, env = "TOOLBENCH_STORE_ID")]
    store_id: Option<String>,

    /// Display name of the current store
    #[arg(long, global = true)]
    store_name: Option<String>,

    /// Directory holding the store's exported data (default root for Scan and Sum)
    #[arg(long, global = true, env = "TOOLBENCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run dangerous commands without asking (DANGEROUS)
    #[arg(long, global = true)]
    dangerously_skip_permissions: bool,

    /// Never prompt; every confirmation is answered "no"
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a JSON array of tool uses from FILE (or stdin) and print the results
    Run {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print the tool schemas
    Schema,
}

fn init_logging(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    // stdout carries the JSON result, so logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let path = match path {
        Some(path) => path.clone(),
        None => EngineConfig::default_path()?,
    };
    EngineConfig::from_file(&path)
}

fn build_context(args: &Args) -> Result<ToolContext> {
    let working_dir = args
        .directory
        .canonicalize()
        .with_context(|| format!("invalid working directory {}", args.directory.display()))?;

    let data_dir = args.data_dir.as_ref().map(|d| working_dir.join(d));
    let ctx = ToolContext::new(working_dir);
    if args.store_id.is_none() && args.store_name.is_none() && data_dir.is_none() {
        return Ok(ctx);
    }
    Ok(ctx.with_store(StoreContext {
        id: args.store_id.clone(),
        name: args.store_name.clone(),
        data_dir,
    }))
}

fn read_tool_uses(file: Option<&PathBuf>) -> Result<Vec<ToolUse>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("input must be a JSON array of {id, name, params}")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    match &args.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&tool_definitions())?);
        }
        Command::Run { file } => {
            let config = load_config(args.config.as_ref())?;
            let ctx = build_context(&args)?;
            debug!(?config, working_dir = %ctx.working_dir.display(), "Engine ready");

            // Tool uses piped on stdin leave no terminal to prompt on.
            let input = if args.non_interactive || file.is_none() {
                SharedInput::new(ScriptedInput::empty())
            } else {
                SharedInput::stdin()
            };

            let uses = read_tool_uses(file.as_ref())?;
            info!(count = uses.len(), "Executing tool uses");

            let executor = ToolExecutor::new(config, input, args.dangerously_skip_permissions);
            let responses = executor.execute_all(&ctx, &uses).await;
            println!("{}", serde_json::to_string_pretty(&responses)?);
        }
    }

    Ok(())
}

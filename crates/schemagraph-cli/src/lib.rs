//! Argument parsing and rendering for the `schemagraph` binary
//!
//! Kept out of `main.rs` so it can be tested without spawning the binary.

use anyhow::{Context as _, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use schemagraph_core::{Context, Graph, GraphAssembler, GraphConfig, ImageCatalog};

pub const APP_NAME: &str = "schemagraph";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    PrettyJson,
    ScriptTag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub snapshot: PathBuf,
    pub config: Option<PathBuf>,
    pub mode: OutputMode,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

pub fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut snapshot: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut mode = OutputMode::PrettyJson;
    let mut quiet = false;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if matches!(arg.as_str(), "-h" | "--help") {
            return Ok(CliCommand::Help);
        }

        if matches!(arg.as_str(), "-v" | "--version") {
            return Ok(CliCommand::Version);
        }

        if matches!(arg.as_str(), "-s" | "--script") {
            mode = OutputMode::ScriptTag;
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-q" | "--quiet") {
            quiet = true;
            i += 1;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--config=") {
            if config.is_some() {
                return Err(anyhow!("--config specified multiple times"));
            }
            if value.is_empty() {
                return Err(anyhow!("--config requires a path"));
            }
            config = Some(PathBuf::from(value));
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-c" | "--config") {
            if config.is_some() {
                return Err(anyhow!("--config specified multiple times"));
            }
            let value = args
                .get(i + 1)
                .filter(|next| !next.starts_with('-'))
                .ok_or_else(|| anyhow!("--config requires a path"))?;
            config = Some(PathBuf::from(value));
            i += 2;
            continue;
        }

        if arg.starts_with('-') {
            return Err(anyhow!("unknown flag: {arg}"));
        }

        if snapshot.is_none() {
            snapshot = Some(PathBuf::from(arg));
        } else {
            return Err(anyhow!("unexpected additional argument: {}", arg));
        }

        i += 1;
    }

    let snapshot = snapshot.ok_or_else(|| anyhow!("missing <SNAPSHOT> argument"))?;

    Ok(CliCommand::Run(CliOptions {
        snapshot,
        config,
        mode,
        quiet,
    }))
}

pub fn print_help() {
    println!("{APP_NAME} — schema.org graphs for page snapshots");
    println!("Usage: {APP_NAME} [OPTIONS] <SNAPSHOT.json>\n");
    println!("Options:");
    println!("  -c, --config <PATH>     Read engine settings from a TOML file");
    println!("  -s, --script            Print a <script type=\"application/ld+json\"> element");
    println!("  -q, --quiet             Only log errors");
    println!("  -v, --version           Show version information");
    println!("  -h, --help              Show this help message");
}

pub fn print_version() {
    println!("{APP_NAME} {VERSION}");
}

/// Input file: the page context plus whatever image metadata is known.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub context: Context,
    #[serde(default)]
    pub images: ImageCatalog,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse snapshot JSON")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<GraphConfig> {
    let Some(path) = path else {
        return Ok(GraphConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    GraphConfig::from_toml_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))
}

/// Build the graph for a snapshot.
pub fn build_graph(snapshot: Snapshot, config: &GraphConfig) -> Result<Graph> {
    snapshot
        .context
        .validate()
        .context("snapshot context is not usable")?;

    let assembler = GraphAssembler::from_config(config, Arc::new(snapshot.images));
    let graph = assembler.build(&snapshot.context);

    tracing::info!(
        page = %snapshot.context.id,
        nodes = graph.len(),
        failures = graph.failures.len(),
        "built schema graph"
    );
    for id in &graph.dangling_references {
        tracing::warn!(id = %id, "graph references an @id that is not in the graph");
    }

    Ok(graph)
}

pub fn render(graph: &Graph, mode: OutputMode) -> Result<String> {
    match mode {
        OutputMode::PrettyJson => Ok(serde_json::to_string_pretty(&graph.to_json_ld())?),
        OutputMode::ScriptTag => Ok(graph.to_script_tag()),
    }
}

/// Read, build and render according to `options`.
pub fn run(options: &CliOptions) -> Result<String> {
    let config = load_config(options.config.as_deref())?;
    let raw = fs::read_to_string(&options.snapshot)
        .with_context(|| format!("failed to read snapshot {}", options.snapshot.display()))?;
    let snapshot = Snapshot::from_json(&raw)?;
    let graph = build_graph(snapshot, &config)?;
    render(&graph, options.mode)
}

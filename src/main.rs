//! symprep binary
//!
//! Run with: `symprep <MODULE.json> [-o OUT] [--stage STAGE]...`

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use symprep::{EntryTablePolicy, Module, PrepareConfig, Preparer, Stage};

#[derive(Parser)]
#[command(name = "symprep")]
#[command(about = "Prepare an IR module for a symbolic-execution verifier")]
#[command(version)]
struct Cli {
    /// Input module (JSON)
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (JSON) overriding the built-in name sets
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stages to run, in order (default: all)
    #[arg(short, long = "stage", value_parser = parse_stage)]
    stages: Vec<Stage>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Json)]
    emit: Emit,

    /// Fail instead of keeping an entry table left by an earlier run
    #[arg(long)]
    reject_existing_table: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    /// serde JSON, readable back by symprep
    Json,
    /// Textual listing
    Text,
}

fn parse_stage(s: &str) -> std::result::Result<Stage, String> {
    s.parse::<Stage>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; diagnostics go to stderr, the module to stdout
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PrepareConfig::from_json(&text)?
        }
        None => PrepareConfig::default(),
    };
    if !cli.stages.is_empty() {
        config.stages = cli.stages.clone();
    }
    if cli.reject_existing_table {
        config.entry_table_policy = EntryTablePolicy::Reject;
    }

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading module {}", cli.input.display()))?;
    let mut module = Module::from_json(&text)
        .with_context(|| format!("decoding module {}", cli.input.display()))?;

    let report = Preparer::new(config)
        .run(&mut module)
        .with_context(|| format!("preparing {}", cli.input.display()))?;
    info!(
        "{} diagnostic(s), {} unsound action(s), modified={}",
        report.diagnostics.len(),
        report.unsound_count(),
        report.modified
    );

    let rendered = match cli.emit {
        Emit::Json => module.to_json()?,
        Emit::Text => module.to_string(),
    };
    match &cli.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", rendered),
    }

    Ok(())
}

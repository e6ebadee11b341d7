//! Full verbose dump of every decoded event in a trace capture.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use etltrace::catalog::{self, SchemaFlavor};
use etltrace::output::dump_events;
use etltrace::reader::TraceFile;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// xperf-compatible event naming
    Xperf,
}

/// Verbose event dump for ETL trace captures
#[derive(Parser, Debug)]
#[command(name = "dump")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the trace capture (.etl)
    trace: PathBuf,

    /// Optional schema naming mode
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let flavor = match cli.mode {
        Some(Mode::Xperf) => SchemaFlavor::Xperf,
        None => SchemaFlavor::Native,
    };

    let trace = TraceFile::open(&cli.trace)
        .with_context(|| format!("Failed to open trace {}", cli.trace.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stats = dump_events(&trace, catalog::catalog(flavor), &mut out)
        .context("Failed to write dump")?;

    info!(
        "{} events ({} unknown, {} skipped)",
        stats.events, stats.unknown, stats.decode_errors
    );

    Ok(())
}

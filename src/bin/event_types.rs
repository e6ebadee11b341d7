//! Prints the distinct event types in a trace capture, with counts.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use etltrace::catalog::{self, SchemaFlavor};
use etltrace::output::{collect_event_types, print_event_types};
use etltrace::reader::TraceFile;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// xperf-compatible event naming
    Xperf,
}

/// Event type census for ETL trace captures
#[derive(Parser, Debug)]
#[command(name = "event-types")]
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

    let types = collect_event_types(&trace, catalog::catalog(flavor));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    print_event_types(&types, &mut out).context("Failed to write census")?;

    Ok(())
}

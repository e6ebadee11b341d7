//! ETL Trace Decoder CLI
//!
//! Decodes an ETL kernel trace capture and prints every event, or, with
//! `--merge-threads`, correlates stack samples with thread scheduling
//! and prints the merged report.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use etltrace::catalog::SchemaFlavor;
use etltrace::commands::{execute_decode, validate_args, DecodeArgs};
use std::path::PathBuf;

/// Schema naming mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// xperf-compatible event naming
    Xperf,
}

/// ETL Trace Decoder - decode and correlate kernel trace captures
#[derive(Parser, Debug)]
#[command(name = "etltrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the trace capture (.etl)
    trace: PathBuf,

    /// Optional schema naming mode
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Correlate stack samples with thread scheduling
    #[arg(long)]
    merge_threads: bool,

    /// Write the structured report to this JSON file
    #[arg(long)]
    json: Option<PathBuf>,

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

    let args = DecodeArgs {
        trace: cli.trace,
        flavor,
        merge_threads: cli.merge_threads,
        output_json: cli.json,
    };

    validate_args(&args)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute_decode(args, &mut out)?;

    Ok(())
}

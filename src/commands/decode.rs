//! Decode command implementation.
//!
//! The decode command:
//! 1. Opens and validates the trace file
//! 2. Streams records through the decoder
//! 3. Prints every event (dump mode) or feeds the merge engine
//! 4. Builds the structured report
//! 5. Writes the JSON report if requested

use crate::catalog::{self, providers, SchemaFlavor};
use crate::decoder::{EventDecoder, FieldValue};
use crate::merge::MergeEngine;
use crate::output::dump::write_event;
use crate::output::event_types::EventTypeCount;
use crate::output::report::{build_merge_report, build_report, render_summary, write_report};
use crate::utils::timestamp::TimestampConverter;
use crate::reader::TraceFile;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the decode command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct DecodeArgs {
    /// Path to the trace capture
    pub trace: PathBuf,

    /// Schema naming flavor (native or xperf)
    pub flavor: SchemaFlavor,

    /// Enable the thread merge / correlation engine
    pub merge_threads: bool,

    /// Output path for the JSON report (optional)
    pub output_json: Option<PathBuf>,
}

impl Default for DecodeArgs {
    fn default() -> Self {
        Self {
            trace: PathBuf::new(),
            flavor: SchemaFlavor::Native,
            merge_threads: false,
            output_json: None,
        }
    }
}

/// Execute the decode command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace open/format failures (fatal, propagated)
/// * Report write failures
///
/// Per-record decode errors are logged and skipped, never fatal.
pub fn execute_decode<W: Write>(args: DecodeArgs, out: &mut W) -> Result<()> {
    let start_time = Instant::now();

    info!("Decoding trace: {}", args.trace.display());

    let trace = TraceFile::open(&args.trace)
        .with_context(|| format!("Failed to open trace {}", args.trace.display()))?;
    let header = *trace.header();
    let converter = TimestampConverter::new(header.start_time, header.clock_frequency);
    let catalog = catalog::catalog(args.flavor);
    let decoder = EventDecoder::new(catalog, header.pointer_size);

    let mut engine = args.merge_threads.then(MergeEngine::new);
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut event_count: u64 = 0;
    let mut unknown_events: u64 = 0;
    let mut decode_errors: u64 = 0;

    for record in trace.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping unreadable record: {e}");
                decode_errors += 1;
                continue;
            }
        };
        let event = match decoder.decode(&record) {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping undecodable record: {e}");
                decode_errors += 1;
                continue;
            }
        };

        event_count += 1;
        if event.is_unknown() {
            unknown_events += 1;
        }
        *counts.entry(event.name.clone()).or_insert(0) += 1;

        // Trace header event carries capture diagnostics worth surfacing.
        if event.provider == providers::EVENT_TRACE && event.opcode == 0 {
            if let Some(lost) = event.field("EventsLost").and_then(FieldValue::as_u64) {
                if lost != 0 {
                    warn!("capture reports {lost} events lost");
                }
            }
        }
        if event.provider == providers::PERF_INFO
            && event.opcode == providers::OP_COLLECTION_START
        {
            if let Some(interval) = event.field("NewInterval").and_then(FieldValue::as_u64) {
                debug!("sample interval: {}ms", interval as f64 * 100.0 / 1_000_000.0);
            }
        }

        match engine.as_mut() {
            Some(engine) => engine.handle_event(&event),
            None => write_event(out, &event, &converter)
                .context("Failed to write event to output")?,
        }
    }

    let mut event_types: Vec<EventTypeCount> = counts
        .into_iter()
        .map(|(name, count)| EventTypeCount { name, count })
        .collect();
    event_types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let merge_report = engine
        .take()
        .map(|engine| build_merge_report(&engine.finish(), &header, &converter));

    let report = build_report(
        &args.trace.display().to_string(),
        &header,
        event_count,
        unknown_events,
        decode_errors,
        event_types,
        merge_report,
    );

    // Merge mode is the report surface; dump mode already printed the
    // events themselves.
    if args.merge_threads {
        writeln!(out, "{}", render_summary(&report))?;
    }

    if let Some(json_path) = &args.output_json {
        write_report(&report, json_path)
            .with_context(|| format!("Failed to write report to {}", json_path.display()))?;
        info!("Report written to: {}", json_path.display());
    }

    let elapsed = start_time.elapsed();
    info!(
        "Decoded {} events ({} unknown, {} skipped) in {:.2}s",
        event_count,
        unknown_events,
        decode_errors,
        elapsed.as_secs_f64()
    );

    Ok(())
}

/// Validate decode arguments
///
/// **Public** - can be called before execute_decode for early validation
pub fn validate_args(args: &DecodeArgs) -> Result<()> {
    if args.trace.as_os_str().is_empty() {
        anyhow::bail!("Trace path cannot be empty");
    }
    if let Some(json) = &args.output_json {
        if json.as_os_str().is_empty() {
            anyhow::bail!("JSON output path cannot be empty");
        }
    }
    Ok(())
}

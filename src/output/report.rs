//! Structured trace report emitter.
//!
//! The default decoder binary renders this report: totals per event type
//! plus, when merge mode is on, per-thread scheduling attribution. The
//! report serializes to JSON with a versioned schema.

use crate::merge::{is_kernel_address, MergeOutcome};
use crate::output::event_types::EventTypeCount;
use crate::reader::TraceHeader;
use crate::utils::config::REPORT_SCHEMA_VERSION;
use crate::utils::error::OutputError;
use crate::utils::timestamp::TimestampConverter;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Trace file the report was generated from
    pub trace_file: String,

    /// Pointer width of the captured system, bits
    pub pointer_bits: u32,

    /// CPUs on the captured system
    pub cpu_count: u32,

    /// Whether timestamps came from the QPC clock
    pub qpc_clock: bool,

    /// Total decoded events
    pub event_count: u64,

    /// Events that fell back to the raw-payload representation
    pub unknown_events: u64,

    /// Records skipped due to decode errors
    pub decode_errors: u64,

    /// Distinct event types with counts, most frequent first
    pub event_types: Vec<EventTypeEntry>,

    /// Per-thread attribution; present only in merge mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeReport>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

/// One row of the event type census
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTypeEntry {
    pub name: String,
    pub count: u64,
}

/// Merge-mode section of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub thread_count: usize,
    pub discarded_samples: u64,
    pub threads: Vec<ThreadSummary>,
}

/// Scheduling attribution for one thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    /// Completed or open scheduled runs
    pub runs: u64,
    /// Stack samples attributed to this thread
    pub samples: u64,
    /// Frames in kernel space across all samples
    pub kernel_frames: u64,
    /// Frames in user space across all samples
    pub user_frames: u64,
    /// Nanoseconds on CPU, summed over completed runs
    pub on_cpu_ns: u64,
    /// Nanoseconds waiting between runs, where known
    pub wait_ns: u64,
    /// First schedule time, nanoseconds since trace start
    pub first_scheduled_ns: u64,
}

/// Build the merge section from a finished merge pass.
///
/// **Public** - used by the decode command
pub fn build_merge_report(
    outcome: &MergeOutcome,
    header: &TraceHeader,
    converter: &TimestampConverter,
) -> MergeReport {
    use std::collections::BTreeMap;

    let mut by_thread: BTreeMap<u32, ThreadSummary> = BTreeMap::new();
    for run in &outcome.records {
        let summary = by_thread
            .entry(run.thread_id)
            .or_insert_with(|| ThreadSummary {
                thread_id: run.thread_id,
                thread_name: None,
                runs: 0,
                samples: 0,
                kernel_frames: 0,
                user_frames: 0,
                on_cpu_ns: 0,
                wait_ns: 0,
                first_scheduled_ns: converter.convert_raw(run.schedule_timestamp),
            });
        summary.runs += 1;
        if summary.thread_name.is_none() {
            summary.thread_name = run.thread_name.clone();
        }
        if let Some(end) = run.run_end {
            summary.on_cpu_ns += converter
                .convert_raw(end)
                .saturating_sub(converter.convert_raw(run.schedule_timestamp));
        }
        if let Some(wait) = run.wait_ticks {
            summary.wait_ns += wait * converter.raw_to_ns_factor;
        }
        for sample in &run.stacks {
            summary.samples += 1;
            for &frame in &sample.frames {
                if is_kernel_address(frame, header.pointer_size) {
                    summary.kernel_frames += 1;
                } else {
                    summary.user_frames += 1;
                }
            }
        }
    }

    MergeReport {
        thread_count: outcome.thread_count,
        discarded_samples: outcome.discarded_samples,
        threads: by_thread.into_values().collect(),
    }
}

/// Assemble the full report.
///
/// **Public** - used by the decode command
#[allow(clippy::too_many_arguments)]
pub fn build_report(
    trace_file: &str,
    header: &TraceHeader,
    event_count: u64,
    unknown_events: u64,
    decode_errors: u64,
    event_types: Vec<EventTypeCount>,
    merge: Option<MergeReport>,
) -> TraceReport {
    TraceReport {
        version: REPORT_SCHEMA_VERSION.to_string(),
        trace_file: trace_file.to_string(),
        pointer_bits: header.pointer_size * 8,
        cpu_count: header.cpu_count,
        qpc_clock: header.is_qpc(),
        event_count,
        unknown_events,
        decode_errors,
        event_types: event_types
            .into_iter()
            .map(|t| EventTypeEntry {
                name: t.name,
                count: t.count,
            })
            .collect(),
        merge,
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Write a report to a JSON file.
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - path is empty or a directory
pub fn write_report(report: &TraceReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    Ok(())
}

/// Read a report back from a JSON file.
///
/// **Public** - useful for validation and testing
pub fn read_report(input_path: impl AsRef<Path>) -> Result<TraceReport, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading report from: {}", input_path.display());
    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: TraceReport =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;
    Ok(report)
}

/// Human-readable text rendering of the report for stdout.
///
/// **Public** - used by the decode command's summary output
pub fn render_summary(report: &TraceReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Trace: {} ({}-bit, {} CPUs, {})",
        report.trace_file,
        report.pointer_bits,
        report.cpu_count,
        if report.qpc_clock { "QPC" } else { "system clock" }
    ));
    lines.push(format!(
        "Events: {} decoded, {} unknown, {} skipped",
        report.event_count, report.unknown_events, report.decode_errors
    ));
    for t in report.event_types.iter().take(10) {
        lines.push(format!("  {:>10}  {}", t.count, t.name));
    }
    if let Some(merge) = &report.merge {
        lines.push(format!(
            "Threads: {} observed, {} samples discarded",
            merge.thread_count, merge.discarded_samples
        ));
        for thread in &merge.threads {
            let name = thread.thread_name.as_deref().unwrap_or("-");
            lines.push(format!(
                "  tid {:>6} {:<20} runs={} samples={} on-cpu={:.3}ms wait={:.3}ms kernel/user frames={}/{}",
                thread.thread_id,
                name,
                thread.runs,
                thread.samples,
                thread.on_cpu_ns as f64 / 1_000_000.0,
                thread.wait_ns as f64 / 1_000_000.0,
                thread.kernel_frames,
                thread.user_frames,
            ));
        }
    }
    lines.join("\n")
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

//! Verbose event dump emitter.
//!
//! Prints every decoded event with all field values. Per-record decode
//! failures are logged and skipped; the dump never aborts on a bad
//! record, so a truncated trace still yields all prior events.

use crate::catalog::Catalog;
use crate::decoder::{EventDecoder, TypedEvent};
use crate::reader::TraceFile;
use crate::utils::error::OutputError;
use crate::utils::timestamp::TimestampConverter;
use log::warn;
use std::io::Write;

/// Counters from one dump pass
#[derive(Debug, Default, Clone, Copy)]
pub struct DumpStats {
    pub events: u64,
    pub unknown: u64,
    pub decode_errors: u64,
}

/// Write one decoded event in dump format.
///
/// **Public** - shared with the default decoder binary's dump mode
pub fn write_event<W: Write>(
    out: &mut W,
    event: &TypedEvent,
    converter: &TimestampConverter,
) -> Result<(), OutputError> {
    writeln!(
        out,
        "{} cpu={} ts={}",
        event.name,
        event.cpu,
        converter.to_millis_string(event.timestamp)
    )?;
    for (name, value) in &event.fields {
        writeln!(out, "    {name} = {value}")?;
    }
    if let Some(raw) = &event.raw_payload {
        writeln!(out, "    raw payload: {} bytes", raw.len())?;
    }
    Ok(())
}

/// Dump every event in the trace to `out`.
///
/// **Public** - main entry point for the `dump` binary
///
/// # Errors
/// Only sink write failures are fatal; decode errors are counted.
pub fn dump_events<W: Write>(
    trace: &TraceFile,
    catalog: &Catalog,
    out: &mut W,
) -> Result<DumpStats, OutputError> {
    let header = trace.header();
    let converter = TimestampConverter::new(header.start_time, header.clock_frequency);
    let decoder = EventDecoder::new(catalog, header.pointer_size);
    let mut stats = DumpStats::default();

    for record in trace.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping unreadable record: {e}");
                stats.decode_errors += 1;
                continue;
            }
        };
        match decoder.decode(&record) {
            Ok(event) => {
                if event.is_unknown() {
                    stats.unknown += 1;
                }
                write_event(out, &event, &converter)?;
                stats.events += 1;
            }
            Err(e) => {
                warn!("skipping undecodable record: {e}");
                stats.decode_errors += 1;
            }
        }
    }
    Ok(stats)
}

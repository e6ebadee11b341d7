//! Event type census emitter.
//!
//! Groups the decoded stream by event type and prints distinct types
//! with counts, most frequent first.

use crate::catalog::Catalog;
use crate::decoder::EventDecoder;
use crate::reader::TraceFile;
use crate::utils::error::OutputError;
use log::warn;
use std::collections::HashMap;
use std::io::Write;

/// One distinct event type and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeCount {
    pub name: String,
    pub count: u64,
}

/// Count events by type over one pass of the trace.
///
/// **Public** - used by the `event-types` binary and the report emitter
///
/// Decode errors are logged and skipped; unknown providers count under
/// their "Unknown(...)" name so nothing disappears from the census.
pub fn collect_event_types(trace: &TraceFile, catalog: &Catalog) -> Vec<EventTypeCount> {
    let decoder = EventDecoder::new(catalog, trace.header().pointer_size);
    let mut counts: HashMap<String, u64> = HashMap::new();

    for record in trace.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping unreadable record: {e}");
                continue;
            }
        };
        match decoder.decode(&record) {
            Ok(event) => *counts.entry(event.name).or_insert(0) += 1,
            Err(e) => warn!("skipping undecodable record: {e}"),
        }
    }

    let mut types: Vec<EventTypeCount> = counts
        .into_iter()
        .map(|(name, count)| EventTypeCount { name, count })
        .collect();
    // Most frequent first; name breaks ties so output is deterministic
    types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    types
}

/// Render the census as a table.
///
/// **Public** - main entry point for the `event-types` binary
pub fn print_event_types<W: Write>(
    types: &[EventTypeCount],
    out: &mut W,
) -> Result<(), OutputError> {
    let total: u64 = types.iter().map(|t| t.count).sum();
    for t in types {
        writeln!(out, "{:>10}  {}", t.count, t.name)?;
    }
    writeln!(out, "{:>10}  total ({} distinct types)", total, types.len())?;
    Ok(())
}

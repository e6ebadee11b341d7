//! Emitters over the decoded event stream.
//!
//! One emitter per surface: verbose dump, event type census, and the
//! merge-aware structured report. All of them treat per-record decode
//! errors as skippable.

pub mod dump;
pub mod event_types;
pub mod report;

// Re-export main types and functions
pub use dump::{dump_events, DumpStats};
pub use event_types::{collect_event_types, print_event_types, EventTypeCount};
pub use report::{build_merge_report, build_report, read_report, render_summary, write_report, TraceReport};

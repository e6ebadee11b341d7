//! Trace container reading.
//!
//! This module handles:
//! - Opening and validating the ETL container header
//! - Sequential scanning of encoded event records

pub mod etl;

// Re-export main types
pub use etl::{EventRecord, RecordIter, TraceFile, TraceHeader};

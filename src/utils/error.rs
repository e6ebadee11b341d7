//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while opening a trace file.
///
/// Both variants are fatal: a trace whose container header cannot be
/// trusted is not worth decoding.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error reading trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid trace format: {0}")]
    Format(String),
}

/// Errors that can occur while decoding a single event record.
///
/// These are recovered locally: the record is skipped and logged, and the
/// rest of the trace is still processed.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("record truncated while reading {field}: need {needed} bytes, {remaining} left")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("missing NUL terminator in string field {0}")]
    UnterminatedString(&'static str),

    #[error("{extra} trailing bytes after last field of {event}")]
    TrailingBytes { event: String, extra: usize },

    #[error("record header corrupt: {0}")]
    BadRecordHeader(String),
}

/// Errors that can occur during report/file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

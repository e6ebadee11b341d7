//! Utility modules for configuration, error handling, and timestamps.

pub mod config;
pub mod error;
pub mod timestamp;

// Re-export commonly used error types for convenience
pub use error::{DecodeError, OutputError, ReadError};
pub use timestamp::TimestampConverter;

//! Thread merge / correlation.
//!
//! This module attributes stack-walk samples to scheduled thread runs.
//! It is only constructed when merge mode is requested on the CLI.

pub mod engine;

// Re-export main types
pub use engine::{is_kernel_address, MergeEngine, MergeOutcome, MergedRecord, StackSample};

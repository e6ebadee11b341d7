//! Event decoding.
//!
//! This module handles:
//! - Matching raw records against catalog schemas
//! - Bounds-checked field extraction with exact widths
//! - Raw-payload fallback for unrecognized providers

pub mod decode;

// Re-export main types
pub use decode::{EventDecoder, FieldValue, TypedEvent};

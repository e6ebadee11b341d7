//! Command implementations for the decoder binaries.

pub mod decode;

pub use decode::{execute_decode, validate_args, DecodeArgs};

//! ETL Trace Decoder
//!
//! Parsing, decoding and reporting for ETL kernel trace captures.
//!
//! This crate provides the core implementation for the `etltrace`,
//! `event-types` and `dump` CLI tools.
//!
//! The pipeline is a single sequential pass:
//! reader ([`reader::TraceFile`]) -> decoder ([`decoder::EventDecoder`],
//! backed by the [`catalog`]) -> one of the [`output`] emitters or the
//! optional [`merge`] correlation engine.

pub mod catalog;
pub mod commands;
pub mod decoder;
pub mod merge;
pub mod output;
pub mod reader;
pub mod utils;

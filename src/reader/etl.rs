//! ETL container reader.
//!
//! The container is a flat little-endian layout:
//!
//! File header, 48 bytes:
//! ```text
//! offset  size  field
//!      0     4  signature "ETLC"
//!      4     2  container version
//!      6     1  pointer size of the captured system (4 or 8)
//!      7     1  flags (bit 0: timestamps are QPC)
//!      8     8  clock frequency, ticks per second
//!     16     8  boot time, 100ns units since epoch
//!     24     8  start time, raw clock ticks
//!     32     4  record count
//!     36     4  CPU count
//!     40     8  reserved
//! ```
//!
//! Followed by `record count` records, each a 32-byte header plus payload,
//! padded to 8-byte alignment:
//! ```text
//! offset  size  field
//!      0    16  provider GUID
//!     16     1  opcode
//!     17     1  event version
//!     18     2  processor index
//!     20     4  payload length
//!     24     8  raw timestamp
//! ```
//!
//! The whole file is buffered on open; the record cursor is lazy,
//! forward-only and non-restartable per scan, but `records()` can be
//! called again to start a fresh scan.

use crate::catalog::Guid;
use crate::utils::config::{
    ETL_SIGNATURE, FILE_HEADER_LEN, MAX_PAYLOAD_LEN, RECORD_ALIGN, RECORD_HEADER_LEN,
    SUPPORTED_VERSION, FLAG_CLOCK_QPC,
};
use crate::utils::error::{DecodeError, ReadError};
use log::{debug, warn};
use std::path::Path;

/// Parsed container header metadata
#[derive(Debug, Clone, Copy)]
pub struct TraceHeader {
    pub version: u16,
    /// Pointer width of the captured system, bytes (4 or 8)
    pub pointer_size: u32,
    pub flags: u8,
    /// Capture clock frequency, ticks per second
    pub clock_frequency: u64,
    /// Boot time of the captured system, 100ns units since epoch
    pub boot_time: u64,
    /// Raw clock tick at trace start; timestamps are relative to this
    pub start_time: u64,
    /// Number of records the capture claims to contain
    pub record_count: u32,
    pub cpu_count: u32,
}

impl TraceHeader {
    /// Whether timestamps were captured with the high-resolution QPC clock.
    pub fn is_qpc(&self) -> bool {
        self.flags & FLAG_CLOCK_QPC != 0
    }
}

/// A raw event record, not yet decoded against a schema.
///
/// Owned transiently by the decoding pass; payload bytes are copied out of
/// the file buffer so the record can outlive the iterator if needed.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub provider: Guid,
    pub opcode: u8,
    pub version: u8,
    /// Processor the event was logged on
    pub cpu: u16,
    /// Raw clock ticks; convert with [`crate::utils::TimestampConverter`]
    pub timestamp: u64,
    pub payload: Vec<u8>,
}

/// An open trace capture: header metadata plus the raw byte buffer.
#[derive(Debug)]
pub struct TraceFile {
    header: TraceHeader,
    buf: Vec<u8>,
}

impl TraceFile {
    /// Open and validate a capture file.
    ///
    /// # Errors
    /// * `ReadError::Io` - file missing or unreadable
    /// * `ReadError::Format` - bad signature, unsupported version, or a
    ///   header field that cannot be honored
    pub fn open(path: impl AsRef<Path>) -> Result<TraceFile, ReadError> {
        let path = path.as_ref();
        debug!("Opening trace file: {}", path.display());
        let buf = std::fs::read(path)?;
        Self::from_bytes(buf)
    }

    /// Validate an in-memory capture. `open` delegates here; tests use it
    /// directly to avoid touching the filesystem.
    pub fn from_bytes(buf: Vec<u8>) -> Result<TraceFile, ReadError> {
        if buf.len() < FILE_HEADER_LEN {
            return Err(ReadError::Format(format!(
                "file too short for header: {} bytes",
                buf.len()
            )));
        }
        if buf[0..4] != ETL_SIGNATURE {
            return Err(ReadError::Format(format!(
                "bad signature {:02x?}, expected {:02x?}",
                &buf[0..4],
                ETL_SIGNATURE
            )));
        }
        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version != SUPPORTED_VERSION {
            return Err(ReadError::Format(format!(
                "unsupported container version {version} (supported: {SUPPORTED_VERSION})"
            )));
        }
        let pointer_size = buf[6];
        if pointer_size != 4 && pointer_size != 8 {
            return Err(ReadError::Format(format!(
                "invalid pointer size {pointer_size}"
            )));
        }
        let flags = buf[7];
        let clock_frequency = read_u64(&buf, 8);
        if clock_frequency == 0 {
            return Err(ReadError::Format("clock frequency is zero".to_string()));
        }
        let header = TraceHeader {
            version,
            pointer_size: pointer_size as u32,
            flags,
            clock_frequency,
            boot_time: read_u64(&buf, 16),
            start_time: read_u64(&buf, 24),
            record_count: read_u32(&buf, 32),
            cpu_count: read_u32(&buf, 36),
        };
        if !header.is_qpc() {
            warn!("trace was not captured with the QPC clock; timestamps may drift");
        }
        debug!(
            "Trace header: {} records, {} CPUs, {}-bit, {} Hz clock",
            header.record_count,
            header.cpu_count,
            header.pointer_size * 8,
            header.clock_frequency
        );
        Ok(TraceFile { header, buf })
    }

    pub fn header(&self) -> &TraceHeader {
        &self.header
    }

    /// Start a sequential scan over the capture's records.
    pub fn records(&self) -> RecordIter<'_> {
        RecordIter {
            buf: &self.buf,
            pos: FILE_HEADER_LEN,
            remaining: self.header.record_count,
            done: false,
        }
    }
}

/// Lazy forward-only cursor over encoded records.
///
/// Yields `Err` once for a record that cannot be framed (truncated file,
/// absurd payload length) and then terminates: after corruption the
/// record boundaries cannot be trusted.
pub struct RecordIter<'a> {
    buf: &'a [u8],
    pos: usize,
    remaining: u32,
    done: bool,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<EventRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == 0 {
            return None;
        }
        match self.read_record() {
            Ok(record) => {
                self.remaining -= 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> RecordIter<'a> {
    fn read_record(&mut self) -> Result<EventRecord, DecodeError> {
        let left = self.buf.len() - self.pos;
        if left < RECORD_HEADER_LEN {
            return Err(DecodeError::Truncated {
                field: "record header",
                needed: RECORD_HEADER_LEN,
                remaining: left,
            });
        }
        let h = &self.buf[self.pos..self.pos + RECORD_HEADER_LEN];
        let mut provider = [0u8; 16];
        provider.copy_from_slice(&h[0..16]);
        let opcode = h[16];
        let version = h[17];
        let cpu = u16::from_le_bytes([h[18], h[19]]);
        let payload_len = u32::from_le_bytes([h[20], h[21], h[22], h[23]]);
        let timestamp = read_u64(h, 24);

        if payload_len > MAX_PAYLOAD_LEN {
            return Err(DecodeError::BadRecordHeader(format!(
                "payload length {payload_len} exceeds {MAX_PAYLOAD_LEN}"
            )));
        }
        let payload_start = self.pos + RECORD_HEADER_LEN;
        let payload_end = payload_start + payload_len as usize;
        if payload_end > self.buf.len() {
            return Err(DecodeError::Truncated {
                field: "record payload",
                needed: payload_len as usize,
                remaining: self.buf.len() - payload_start,
            });
        }
        let payload = self.buf[payload_start..payload_end].to_vec();

        // Advance to the next 8-byte boundary
        let advance = RECORD_HEADER_LEN + payload_len as usize;
        let padded = (advance + RECORD_ALIGN - 1) / RECORD_ALIGN * RECORD_ALIGN;
        self.pos = (self.pos + padded).min(self.buf.len());

        Ok(EventRecord {
            provider: Guid(provider),
            opcode,
            version,
            cpu,
            timestamp,
            payload,
        })
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    u64::from_le_bytes([
        buf[at],
        buf[at + 1],
        buf[at + 2],
        buf[at + 3],
        buf[at + 4],
        buf[at + 5],
        buf[at + 6],
        buf[at + 7],
    ])
}

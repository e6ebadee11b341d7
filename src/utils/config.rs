//! Configuration and constants for the decoder.

/// Container signature at offset 0 of every capture file
pub const ETL_SIGNATURE: [u8; 4] = *b"ETLC";

/// Container version this decoder understands
pub const SUPPORTED_VERSION: u16 = 2;

/// Fixed size of the file header, bytes
pub const FILE_HEADER_LEN: usize = 48;

/// Fixed size of each record header, bytes
pub const RECORD_HEADER_LEN: usize = 32;

/// Record payloads are padded to this alignment
pub const RECORD_ALIGN: usize = 8;

// Payloads larger than a capture buffer cannot occur in a well-formed
// trace; anything above this is treated as corruption.
pub const MAX_PAYLOAD_LEN: u32 = 64 * 1024;

/// Header flag bit: timestamps were captured with QPC
pub const FLAG_CLOCK_QPC: u8 = 0x01;

// Addresses at or above the cutoff belong to kernel space.
pub const KERNEL_ADDRESS_CUTOFF_32: u64 = 0x8000_0000;
pub const KERNEL_ADDRESS_CUTOFF_64: u64 = 0xFFFF_0000_0000_0000;

/// Current report schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

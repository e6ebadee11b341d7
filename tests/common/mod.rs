//! Synthetic trace capture builder for tests.
//!
//! Encodes the same container layout the reader parses: 48-byte file
//! header, then 32-byte record headers plus payloads padded to 8 bytes.

#![allow(dead_code)]

use etltrace::catalog::Guid;

const SIGNATURE: [u8; 4] = *b"ETLC";
const VERSION: u16 = 2;

struct RawRecord {
    provider: Guid,
    opcode: u8,
    version: u8,
    cpu: u16,
    timestamp: u64,
    payload: Vec<u8>,
}

/// Builds trace capture bytes record by record.
pub struct TraceWriter {
    pub pointer_size: u8,
    pub flags: u8,
    pub clock_frequency: u64,
    pub boot_time: u64,
    pub start_time: u64,
    pub cpu_count: u32,
    /// Overrides the record count written to the header when set
    pub declared_count: Option<u32>,
    records: Vec<RawRecord>,
}

impl TraceWriter {
    pub fn new() -> Self {
        Self {
            pointer_size: 8,
            flags: 0x01, // QPC
            clock_frequency: 10_000_000,
            boot_time: 0,
            start_time: 1_000,
            cpu_count: 4,
            declared_count: None,
            records: Vec::new(),
        }
    }

    pub fn with_pointer_size(mut self, pointer_size: u8) -> Self {
        self.pointer_size = pointer_size;
        self
    }

    pub fn push_record(
        &mut self,
        provider: Guid,
        opcode: u8,
        cpu: u16,
        timestamp: u64,
        payload: Vec<u8>,
    ) {
        self.records.push(RawRecord {
            provider,
            opcode,
            version: 2,
            cpu,
            timestamp,
            payload,
        });
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIGNATURE);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.push(self.pointer_size);
        buf.push(self.flags);
        buf.extend_from_slice(&self.clock_frequency.to_le_bytes());
        buf.extend_from_slice(&self.boot_time.to_le_bytes());
        buf.extend_from_slice(&self.start_time.to_le_bytes());
        let count = self
            .declared_count
            .unwrap_or(self.records.len() as u32);
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&self.cpu_count.to_le_bytes());
        buf.extend_from_slice(&[0u8; 8]);
        assert_eq!(buf.len(), 48);

        for record in &self.records {
            buf.extend_from_slice(&record.provider.0);
            buf.push(record.opcode);
            buf.push(record.version);
            buf.extend_from_slice(&record.cpu.to_le_bytes());
            buf.extend_from_slice(&(record.payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(&record.timestamp.to_le_bytes());
            buf.extend_from_slice(&record.payload);
            while buf.len() % 8 != 0 {
                buf.push(0);
            }
        }
        buf
    }
}

// ---- payload builders ----

pub fn cswitch_payload(new_thread: u32, old_thread: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&new_thread.to_le_bytes());
    p.extend_from_slice(&old_thread.to_le_bytes());
    // priorities, c-state, spare, wait reason/mode/state/processor
    p.extend_from_slice(&[8, 8, 0, 0, 0, 0, 1, 0]);
    p.extend_from_slice(&0u32.to_le_bytes()); // NewThreadWaitTime
    p.extend_from_slice(&0u32.to_le_bytes()); // Reserved
    p
}

pub fn stack_payload(event_timestamp: u64, process_id: u32, thread_id: u32, frames: &[u64]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&event_timestamp.to_le_bytes());
    p.extend_from_slice(&process_id.to_le_bytes());
    p.extend_from_slice(&thread_id.to_le_bytes());
    for frame in frames {
        p.extend_from_slice(&frame.to_le_bytes());
    }
    p
}

pub fn sample_prof_payload(instruction_pointer: u64, thread_id: u32, count: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&instruction_pointer.to_le_bytes());
    p.extend_from_slice(&thread_id.to_le_bytes());
    p.extend_from_slice(&count.to_le_bytes());
    p
}

pub fn thread_start_payload(process_id: u32, thread_id: u32, start_addr: u64, name: &str) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&process_id.to_le_bytes());
    p.extend_from_slice(&thread_id.to_le_bytes());
    p.extend_from_slice(&start_addr.to_le_bytes());
    push_wide_string(&mut p, name);
    p
}

pub fn set_name_payload(process_id: u32, thread_id: u32, name: &str) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&process_id.to_le_bytes());
    p.extend_from_slice(&thread_id.to_le_bytes());
    push_wide_string(&mut p, name);
    p
}

pub fn process_start_payload(
    unique_key: u64,
    process_id: u32,
    parent_id: u32,
    session_id: u32,
    exit_status: i32,
    image_name: &str,
) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&unique_key.to_le_bytes());
    p.extend_from_slice(&process_id.to_le_bytes());
    p.extend_from_slice(&parent_id.to_le_bytes());
    p.extend_from_slice(&session_id.to_le_bytes());
    p.extend_from_slice(&exit_status.to_le_bytes());
    p.extend_from_slice(image_name.as_bytes());
    p.push(0);
    p
}

pub fn header_event_payload(events_lost: u32, perf_freq: u64) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&65536u32.to_le_bytes()); // BufferSize
    p.extend_from_slice(&2u32.to_le_bytes()); // Version
    p.extend_from_slice(&2u32.to_le_bytes()); // ProviderVersion
    p.extend_from_slice(&4u32.to_le_bytes()); // NumberOfProcessors
    p.extend_from_slice(&0u64.to_le_bytes()); // EndTime
    p.extend_from_slice(&156250u32.to_le_bytes()); // TimerResolution
    p.extend_from_slice(&0u32.to_le_bytes()); // MaxFileSize
    p.extend_from_slice(&0u32.to_le_bytes()); // LogFileMode
    p.extend_from_slice(&1u32.to_le_bytes()); // BuffersWritten
    p.extend_from_slice(&events_lost.to_le_bytes()); // EventsLost
    p.extend_from_slice(&2400u32.to_le_bytes()); // CPUSpeed
    p.extend_from_slice(&perf_freq.to_le_bytes()); // PerfFreq
    p.extend_from_slice(&0u64.to_le_bytes()); // BootTime
    p.extend_from_slice(&1000u64.to_le_bytes()); // StartTime
    p.extend_from_slice(&8u32.to_le_bytes()); // PointerSize
    p.extend_from_slice(&1u32.to_le_bytes()); // ReservedFlags
    p
}

fn push_wide_string(p: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16() {
        p.extend_from_slice(&unit.to_le_bytes());
    }
    p.extend_from_slice(&0u16.to_le_bytes());
}

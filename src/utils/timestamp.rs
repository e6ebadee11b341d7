//! Conversion from raw trace ticks to nanoseconds.
//!
//! Raw event timestamps are in units of the capture clock. The container
//! header carries the clock frequency; everything downstream works in
//! nanoseconds relative to the trace start.

/// Converts raw trace timestamps to nanoseconds since trace start.
#[derive(Debug, Clone, Copy)]
pub struct TimestampConverter {
    /// A reference timestamp, as a raw timestamp.
    pub reference_raw: u64,
    /// Nanoseconds per raw tick. If raw values are in nanoseconds, this is 1.
    pub raw_to_ns_factor: u64,
}

impl TimestampConverter {
    /// Build a converter from a reference tick and a clock frequency in Hz.
    ///
    /// A zero frequency is rejected by the reader before this is reached.
    pub fn new(reference_raw: u64, clock_frequency: u64) -> Self {
        Self {
            reference_raw,
            raw_to_ns_factor: 1_000_000_000 / clock_frequency.max(1),
        }
    }

    /// Nanoseconds since the reference timestamp.
    pub fn convert_raw(&self, raw: u64) -> u64 {
        raw.saturating_sub(self.reference_raw) * self.raw_to_ns_factor
    }

    /// Render a raw timestamp as fractional milliseconds since trace start.
    pub fn to_millis_string(&self, raw: u64) -> String {
        let ns = self.convert_raw(raw);
        format!("{:.3}ms", ns as f64 / 1_000_000.0)
    }
}

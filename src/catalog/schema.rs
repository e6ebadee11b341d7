//! Schema definitions for the event type catalog.
//!
//! An [`EventSchema`] describes the payload layout of one (provider, opcode)
//! pair: an ordered list of named fields and how each is encoded. Schemas
//! are static data; the catalog in `providers.rs` owns the actual table.

use std::fmt;

/// A provider GUID, stored in its on-disk (little-endian mixed) byte order.
///
/// Equality and hashing work on the raw bytes, so schemas can be keyed by
/// GUID without ever re-encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Build a GUID from its canonical fields, e.g.
    /// `Guid::from_fields(0x3d6fa8d1, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c])`
    /// for `{3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c}`.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        let d1 = data1.to_le_bytes();
        let d2 = data2.to_le_bytes();
        let d3 = data3.to_le_bytes();
        Guid([
            d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], data4[0], data4[1],
            data4[2], data4[3], data4[4], data4[5], data4[6], data4[7],
        ])
    }

    fn data1(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    fn data2(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    fn data3(&self) -> u16 {
        u16::from_le_bytes([self.0[6], self.0[7]])
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1(),
            self.data2(),
            self.data3(),
            self.0[8],
            self.0[9],
            self.0[10],
            self.0[11],
            self.0[12],
            self.0[13],
            self.0[14],
            self.0[15],
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

/// How a single payload field is encoded.
///
/// All multi-byte integers are little-endian. `Pointer` fields take their
/// width from the capture's pointer size, not from the decoding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    /// Pointer-sized unsigned integer (4 or 8 bytes per the trace header)
    Pointer,
    /// NUL-terminated single-byte string
    AnsiString,
    /// NUL-terminated UTF-16LE string
    WideString,
    /// Trailing array of pointer-sized values, consuming the rest of the
    /// payload. Only valid as the final field of a schema.
    PointerArray,
}

impl FieldKind {
    /// Fixed encoded size in bytes, or None for variable-length kinds.
    pub fn fixed_size(&self, pointer_size: u32) -> Option<usize> {
        match self {
            FieldKind::U8 | FieldKind::I8 => Some(1),
            FieldKind::U16 | FieldKind::I16 => Some(2),
            FieldKind::U32 | FieldKind::I32 => Some(4),
            FieldKind::U64 | FieldKind::I64 => Some(8),
            FieldKind::Pointer => Some(pointer_size as usize),
            FieldKind::AnsiString | FieldKind::WideString | FieldKind::PointerArray => None,
        }
    }
}

/// One named field in an event payload
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Shorthand used by the provider table
pub const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// Static catalog entry describing one event type.
#[derive(Debug, Clone, Copy)]
pub struct EventSchema {
    /// Provider GUID, half of the composite lookup key
    pub provider: Guid,
    /// Opcode within the provider, the other half of the key
    pub opcode: u8,
    /// Provider-qualified task name, e.g. "MSNT_SystemTrace/Thread"
    pub task: &'static str,
    /// Operation name within the task, e.g. "CSwitch"
    pub op_name: &'static str,
    /// Short xperf-style label, e.g. "CSwitch" or "T-Start"
    pub xperf_label: &'static str,
    /// Ordered payload layout
    pub fields: &'static [Field],
}

impl EventSchema {
    /// Full native event name, e.g. "MSNT_SystemTrace/Thread/CSwitch".
    pub fn native_name(&self) -> String {
        format!("{}/{}", self.task, self.op_name)
    }

    /// Sum of the fixed-size fields; variable fields contribute nothing.
    /// Used for fast sanity checks before a field walk.
    pub fn min_payload_len(&self, pointer_size: u32) -> usize {
        self.fields
            .iter()
            .filter_map(|f| f.kind.fixed_size(pointer_size))
            .sum()
    }

    /// Whether the schema ends in a field that consumes the payload tail.
    pub fn has_variable_tail(&self) -> bool {
        matches!(
            self.fields.last().map(|f| f.kind),
            Some(FieldKind::PointerArray)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_display_round_trip() {
        let guid = Guid::from_fields(
            0x3d6fa8d1,
            0xfe05,
            0x11d0,
            [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
        );
        assert_eq!(guid.to_string(), "3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c");
    }

    #[test]
    fn test_guid_equality_on_bytes() {
        let a = Guid::from_fields(0x1, 0x2, 0x3, [4, 5, 6, 7, 8, 9, 10, 11]);
        let b = Guid::from_fields(0x1, 0x2, 0x3, [4, 5, 6, 7, 8, 9, 10, 11]);
        let c = Guid::from_fields(0x1, 0x2, 0x4, [4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pointer_size_dependent_width() {
        assert_eq!(FieldKind::Pointer.fixed_size(4), Some(4));
        assert_eq!(FieldKind::Pointer.fixed_size(8), Some(8));
        assert_eq!(FieldKind::WideString.fixed_size(8), None);
    }
}

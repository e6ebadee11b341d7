//! Decoding of raw event records against catalog schemas.
//!
//! The decoder walks a schema's field list over the payload bytes in
//! order. Every numeric field is read with its declared width and
//! signedness; nothing is truncated or silently dropped. A record whose
//! provider/opcode is not in the catalog decodes to an "unknown" event
//! that keeps the raw payload, which is deliberately not an error.

use crate::catalog::{Catalog, EventSchema, FieldKind, Guid};
use crate::reader::EventRecord;
use crate::utils::error::DecodeError;
use std::fmt;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    /// Pointer-sized value, widened to 64 bits
    Pointer(u64),
    Str(String),
    /// Trailing pointer array (stack frames), widened to 64 bits
    PointerArray(Vec<u64>),
}

impl FieldValue {
    /// The value as u64, if it is any unsigned integer or pointer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::U8(v) => Some(*v as u64),
            FieldValue::U16(v) => Some(*v as u64),
            FieldValue::U32(v) => Some(*v as u64),
            FieldValue::U64(v) | FieldValue::Pointer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pointer_array(&self) -> Option<&[u64]> {
        match self {
            FieldValue::PointerArray(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U8(v) => write!(f, "{v}"),
            FieldValue::I8(v) => write!(f, "{v}"),
            FieldValue::U16(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::I32(v) => write!(f, "{v}"),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::Pointer(v) => write!(f, "{v:#x}"),
            FieldValue::Str(s) => write!(f, "{s:?}"),
            FieldValue::PointerArray(frames) => {
                write!(f, "[")?;
                for (i, frame) in frames.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{frame:#x}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A decoded event: a raw record matched against a schema.
#[derive(Debug, Clone)]
pub struct TypedEvent {
    /// Display name in the catalog's flavor, e.g.
    /// "MSNT_SystemTrace/Thread/CSwitch" or "Unknown(guid/opcode)"
    pub name: String,
    pub provider: Guid,
    pub opcode: u8,
    /// Raw clock ticks
    pub timestamp: u64,
    /// Processor the event was logged on
    pub cpu: u16,
    /// Decoded fields, in schema order. Empty for unknown events.
    pub fields: Vec<(&'static str, FieldValue)>,
    /// Raw payload, kept only for unknown events
    pub raw_payload: Option<Vec<u8>>,
}

// Field names that carry thread/process identity, in lookup order.
const THREAD_ID_FIELDS: &[&str] = &["ThreadId", "TThreadId", "StackThread", "NewThreadId"];
const PROCESS_ID_FIELDS: &[&str] = &["ProcessId", "StackProcess"];

impl TypedEvent {
    /// Whether this event fell back to the raw-payload representation.
    pub fn is_unknown(&self) -> bool {
        self.raw_payload.is_some()
    }

    /// Look up a decoded field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Thread id carried by this event's payload, if the schema has one.
    pub fn thread_id(&self) -> Option<u32> {
        THREAD_ID_FIELDS
            .iter()
            .find_map(|name| self.field(name).and_then(FieldValue::as_u32))
    }

    /// Process id carried by this event's payload, if the schema has one.
    pub fn process_id(&self) -> Option<u32> {
        PROCESS_ID_FIELDS
            .iter()
            .find_map(|name| self.field(name).and_then(FieldValue::as_u32))
    }
}

/// Decodes raw records using a catalog and the capture's pointer size.
pub struct EventDecoder<'c> {
    catalog: &'c Catalog,
    pointer_size: u32,
}

impl<'c> EventDecoder<'c> {
    pub fn new(catalog: &'c Catalog, pointer_size: u32) -> Self {
        Self {
            catalog,
            pointer_size,
        }
    }

    /// Decode one record.
    ///
    /// # Errors
    /// `DecodeError` when the payload does not match the schema-implied
    /// layout. Unknown (provider, opcode) pairs are not errors.
    pub fn decode(&self, record: &EventRecord) -> Result<TypedEvent, DecodeError> {
        let Some(schema) = self.catalog.lookup(&record.provider, record.opcode) else {
            return Ok(TypedEvent {
                name: format!("Unknown({}/{})", record.provider, record.opcode),
                provider: record.provider,
                opcode: record.opcode,
                timestamp: record.timestamp,
                cpu: record.cpu,
                fields: Vec::new(),
                raw_payload: Some(record.payload.clone()),
            });
        };
        let fields = self.decode_fields(schema, &record.payload)?;
        Ok(TypedEvent {
            name: self.catalog.event_name(schema),
            provider: record.provider,
            opcode: record.opcode,
            timestamp: record.timestamp,
            cpu: record.cpu,
            fields,
            raw_payload: None,
        })
    }

    fn decode_fields(
        &self,
        schema: &EventSchema,
        payload: &[u8],
    ) -> Result<Vec<(&'static str, FieldValue)>, DecodeError> {
        let mut cursor = PayloadCursor::new(payload, self.pointer_size);
        let mut fields = Vec::with_capacity(schema.fields.len());
        for field in schema.fields {
            let value = cursor.read(field.name, field.kind)?;
            fields.push((field.name, value));
        }
        if cursor.remaining() > 0 {
            return Err(DecodeError::TrailingBytes {
                event: schema.native_name(),
                extra: cursor.remaining(),
            });
        }
        Ok(fields)
    }
}

/// Sequential reader over a payload slice. All reads are bounds-checked;
/// overflowing the buffer is a `DecodeError`, never a panic.
struct PayloadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    pointer_size: u32,
}

impl<'a> PayloadCursor<'a> {
    fn new(buf: &'a [u8], pointer_size: u32) -> Self {
        Self {
            buf,
            pos: 0,
            pointer_size,
        }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                field,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read(&mut self, name: &'static str, kind: FieldKind) -> Result<FieldValue, DecodeError> {
        let value = match kind {
            FieldKind::U8 => FieldValue::U8(self.take(1, name)?[0]),
            FieldKind::I8 => FieldValue::I8(self.take(1, name)?[0] as i8),
            FieldKind::U16 => {
                let b = self.take(2, name)?;
                FieldValue::U16(u16::from_le_bytes([b[0], b[1]]))
            }
            FieldKind::I16 => {
                let b = self.take(2, name)?;
                FieldValue::I16(i16::from_le_bytes([b[0], b[1]]))
            }
            FieldKind::U32 => {
                let b = self.take(4, name)?;
                FieldValue::U32(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            FieldKind::I32 => {
                let b = self.take(4, name)?;
                FieldValue::I32(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            FieldKind::U64 => FieldValue::U64(self.read_u64(name)?),
            FieldKind::I64 => FieldValue::I64(self.read_u64(name)? as i64),
            FieldKind::Pointer => FieldValue::Pointer(self.read_pointer(name)?),
            FieldKind::AnsiString => FieldValue::Str(self.read_ansi_string(name)?),
            FieldKind::WideString => FieldValue::Str(self.read_wide_string(name)?),
            FieldKind::PointerArray => FieldValue::PointerArray(self.read_pointer_array(name)?),
        };
        Ok(value)
    }

    fn read_u64(&mut self, name: &'static str) -> Result<u64, DecodeError> {
        let b = self.take(8, name)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_pointer(&mut self, name: &'static str) -> Result<u64, DecodeError> {
        if self.pointer_size == 4 {
            let b = self.take(4, name)?;
            Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64)
        } else {
            self.read_u64(name)
        }
    }

    fn read_ansi_string(&mut self, name: &'static str) -> Result<String, DecodeError> {
        let rest = &self.buf[self.pos..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(DecodeError::UnterminatedString(name));
        };
        let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos += nul + 1;
        Ok(s)
    }

    fn read_wide_string(&mut self, name: &'static str) -> Result<String, DecodeError> {
        let mut units = Vec::new();
        loop {
            let b = self.take(2, name)?;
            let unit = u16::from_le_bytes([b[0], b[1]]);
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    fn read_pointer_array(&mut self, name: &'static str) -> Result<Vec<u64>, DecodeError> {
        let psize = self.pointer_size as usize;
        if self.remaining() % psize != 0 {
            return Err(DecodeError::Truncated {
                field: name,
                needed: psize,
                remaining: self.remaining() % psize,
            });
        }
        let mut frames = Vec::with_capacity(self.remaining() / psize);
        while self.remaining() > 0 {
            frames.push(self.read_pointer(name)?);
        }
        Ok(frames)
    }
}

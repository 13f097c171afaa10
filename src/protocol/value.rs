//! Value encoding by class
//!
//! A series' class decides how a row value is laid out:
//!
//! ```text
//! Fixed  ┌──────────────────────┐
//!        │ 8 bytes, big-endian  │
//!        └──────────────────────┘
//! Blob   ┌──────────┬───────────┐
//!        │ Len (4)  │ bytes     │
//!        └──────────┴───────────┘
//! ```
//!
//! Values are a closed union checked against the class before any byte is
//! written, so a mismatch never reaches the connection.

use bytes::{Bytes, BytesMut};

use crate::codec::{self, Decoder, Encode, Writer, LEN_PREFIX_SIZE};
use crate::error::{Result, WireError};

/// Width of a fixed-class value
pub const FIXED_VALUE_SIZE: usize = 8;

/// Width of the quality field
pub const QUALITY_SIZE: usize = 4;

/// Per-series value layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ValueClass {
    /// Exactly 8 bytes (booleans, integers, floats)
    #[default]
    Fixed = 0,
    /// Length-prefixed bytes (strings, binary)
    Blob = 1,
}

impl TryFrom<u8> for ValueClass {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ValueClass::Fixed),
            1 => Ok(ValueClass::Blob),
            _ => Err(WireError::Protocol(format!("Unknown value class: {}", byte))),
        }
    }
}

/// A row value supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
}

impl Value {
    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

/// A value already checked against its class
#[derive(Debug, Clone, Copy)]
pub struct TypedValue<'a> {
    wire: Wire<'a>,
}

/// The only encodings a validated value can take
#[derive(Debug, Clone, Copy)]
enum Wire<'a> {
    Fixed([u8; FIXED_VALUE_SIZE]),
    Blob(&'a [u8]),
}

impl<'a> TypedValue<'a> {
    /// Bind `value` to `class`, rejecting unsupported combinations.
    pub fn new(class: ValueClass, value: &'a Value) -> Result<Self> {
        let wire = match (class, value) {
            (ValueClass::Fixed, Value::Bool(b)) => Wire::Fixed((*b as i64).to_be_bytes()),
            (ValueClass::Fixed, Value::Int(i)) => Wire::Fixed(i.to_be_bytes()),
            (ValueClass::Fixed, Value::Float(f)) => Wire::Fixed(f.to_bits().to_be_bytes()),
            (ValueClass::Fixed, Value::Bytes(b)) => <[u8; FIXED_VALUE_SIZE]>::try_from(&b[..])
                .map(Wire::Fixed)
                .map_err(|_| unsupported(class, value))?,
            (ValueClass::Blob, Value::Str(s)) => Wire::Blob(s.as_bytes()),
            (ValueClass::Blob, Value::Bytes(b)) => Wire::Blob(&b[..]),
            (ValueClass::Fixed, Value::Str(_))
            | (ValueClass::Blob, Value::Bool(_) | Value::Int(_) | Value::Float(_)) => {
                return Err(unsupported(class, value))
            }
        };
        Ok(Self { wire })
    }

    pub fn class(&self) -> ValueClass {
        match self.wire {
            Wire::Fixed(_) => ValueClass::Fixed,
            Wire::Blob(_) => ValueClass::Blob,
        }
    }

    /// Encoded width in bytes
    pub fn size(&self) -> usize {
        match self.wire {
            Wire::Fixed(_) => FIXED_VALUE_SIZE,
            Wire::Blob(b) => LEN_PREFIX_SIZE + b.len(),
        }
    }
}

fn unsupported(class: ValueClass, value: &Value) -> WireError {
    let detail = match value {
        Value::Bytes(b) if class == ValueClass::Fixed => {
            format!("bytes of length {} (need {})", b.len(), FIXED_VALUE_SIZE)
        }
        other => other.kind().to_string(),
    };
    WireError::Encoding(format!(
        "cannot encode {} as {:?} class value",
        detail, class
    ))
}

impl Encode for TypedValue<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        match self.wire {
            Wire::Fixed(bytes) => w.put_raw(&bytes),
            Wire::Blob(bytes) => w.put_blob(bytes),
        }
    }
}

/// Read one value of `class`; interpretation is left to the caller.
pub fn read_value(dec: &mut Decoder, class: ValueClass) -> Result<Bytes> {
    match class {
        ValueClass::Fixed => dec.raw(FIXED_VALUE_SIZE),
        ValueClass::Blob => dec.blob(),
    }
}

// =============================================================================
// Packed rows (bulk insert records)
// =============================================================================

/// One self-describing row record:
/// `series_id(8) + class(1) + timestamp(8) + value + quality(4)`
#[derive(Debug, Clone, Copy)]
pub struct PackedRow<'a> {
    pub series_id: i64,
    pub timestamp: i64,
    pub quality: u32,
    pub value: TypedValue<'a>,
}

impl Encode for PackedRow<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.series_id);
        w.put_u8(self.value.class() as u8);
        w.put_i64(self.timestamp);
        self.value.encode(w);
        w.put_u32(self.quality);
    }
}

/// Pack a single row record into an exactly sized buffer.
pub fn pack_row(
    series_id: i64,
    class: ValueClass,
    timestamp: i64,
    quality: u32,
    value: &Value,
) -> Result<Bytes> {
    let row = PackedRow {
        series_id,
        timestamp,
        quality,
        value: TypedValue::new(class, value)?,
    };
    codec::encode_exact(&row)
}

/// Concatenated packed rows for the bulk insert opcodes
#[derive(Debug, Clone, Default)]
pub struct RowBatch {
    buf: BytesMut,
    rows: usize,
}

impl RowBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row; the batch is unchanged if the value is rejected.
    pub fn push(
        &mut self,
        series_id: i64,
        class: ValueClass,
        timestamp: i64,
        quality: u32,
        value: &Value,
    ) -> Result<&mut Self> {
        let packed = pack_row(series_id, class, timestamp, quality, value)?;
        self.buf.extend_from_slice(&packed);
        self.rows += 1;
        Ok(self)
    }

    /// Number of rows packed
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Packed bytes, exactly as they go on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

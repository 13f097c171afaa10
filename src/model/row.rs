//! Rows, boundaries and pages
//!
//! ## Page Wire Layout
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────┬──────────────────────────┐
//! │ startCP  │ endCP    │ more (1) │ count (8) │ count × row              │
//! └──────────┴──────────┴──────────┴───────────┴──────────────────────────┘
//! row = timestamp (8) + value (class) + quality (4)
//! ```

use std::fmt;

use bytes::Bytes;

use crate::codec::Decoder;
use crate::error::{Result, WireError};
use crate::protocol::value::{read_value, FIXED_VALUE_SIZE, QUALITY_SIZE};
use crate::protocol::ValueClass;

/// Scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Direction {
    Backward = 0,
    #[default]
    Forward = 1,
}

/// Opaque resume token issued by the server.
///
/// Held as raw bytes with no ordering or equality: the only thing a client
/// may do with a checkpoint is hand it back unchanged.
#[derive(Clone)]
pub struct Checkpoint(Bytes);

impl Checkpoint {
    pub(crate) fn decode(dec: &mut Decoder) -> Result<Self> {
        Ok(Self(dec.blob()?))
    }

    /// The token exactly as received
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the server sent an empty token
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Checkpoint")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// One stored sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    timestamp: i64,
    value: Bytes,
    quality: [u8; QUALITY_SIZE],
}

impl Row {
    pub fn new(timestamp: i64, value: Bytes, quality: [u8; QUALITY_SIZE]) -> Self {
        Self {
            timestamp,
            value,
            quality,
        }
    }

    /// Decode `timestamp + value(class) + quality`
    pub fn decode(dec: &mut Decoder, class: ValueClass) -> Result<Self> {
        let timestamp = dec.i64()?;
        let value = read_value(dec, class)?;
        let quality = dec.array::<QUALITY_SIZE>()?;
        Ok(Self::new(timestamp, value, quality))
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Raw value bytes
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Raw quality bytes
    pub fn quality(&self) -> [u8; QUALITY_SIZE] {
        self.quality
    }

    pub fn quality_u32(&self) -> u32 {
        u32::from_be_bytes(self.quality)
    }

    /// Fixed-class value read as a signed integer
    pub fn as_i64(&self) -> Option<i64> {
        self.fixed().map(i64::from_be_bytes)
    }

    /// Fixed-class value read as a float bit pattern
    pub fn as_f64(&self) -> Option<f64> {
        self.fixed().map(|b| f64::from_bits(u64::from_be_bytes(b)))
    }

    /// Fixed-class value read as a boolean (non-zero is true)
    pub fn as_bool(&self) -> Option<bool> {
        self.fixed().map(|b| u64::from_be_bytes(b) != 0)
    }

    /// Blob-class value read as UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    fn fixed(&self) -> Option<[u8; FIXED_VALUE_SIZE]> {
        <[u8; FIXED_VALUE_SIZE]>::try_from(&self.value[..]).ok()
    }
}

/// Occupied time range of a series
#[derive(Debug, Clone)]
pub struct Boundary {
    pub min: i64,
    pub max: i64,
    pub row_count: i64,
    pub start_cp: Checkpoint,
    pub end_cp: Checkpoint,
}

impl Boundary {
    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        Ok(Self {
            min: dec.i64()?,
            max: dec.i64()?,
            row_count: dec.i64()?,
            start_cp: Checkpoint::decode(dec)?,
            end_cp: Checkpoint::decode(dec)?,
        })
    }
}

/// One batch of scan results
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Vec<Row>,
    pub start_cp: Checkpoint,
    pub end_cp: Checkpoint,
    /// More data exists beyond this page in the requested direction
    pub has_continuation: bool,
}

impl Page {
    pub fn decode(dec: &mut Decoder, class: ValueClass) -> Result<Self> {
        let start_cp = Checkpoint::decode(dec)?;
        let end_cp = Checkpoint::decode(dec)?;
        let has_continuation = dec.bool()?;
        let count = dec.i64()?;
        if count < 0 {
            return Err(WireError::Protocol(format!("negative row count: {}", count)));
        }

        // Each row takes at least 12 bytes; cap the preallocation by what
        // the payload can actually hold.
        let mut rows = Vec::with_capacity((count as usize).min(dec.remaining() / 12));
        for _ in 0..count {
            rows.push(Row::decode(dec, class)?);
        }

        Ok(Self {
            rows,
            start_cp,
            end_cp,
            has_continuation,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checkpoint to resume from when continuing in `direction`
    pub fn resume_point(&self, direction: Direction) -> &Checkpoint {
        match direction {
            Direction::Forward => &self.end_cp,
            Direction::Backward => &self.start_cp,
        }
    }
}

//! Request/response envelope
//!
//! Framing of every exchange, plus stream helpers that reassemble a response
//! from however many reads the socket delivers it in.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Op (1)   │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! Parameterless opcodes send the opcode byte alone.
//!
//! ### Response
//! ```text
//! failure  ┌──────────┬──────────┬──────────────────────────┐
//!          │Status(1) │ Len (4)  │ Len(4) + UTF-8 message   │
//!          └──────────┴──────────┴──────────────────────────┘
//! success  ┌──────────┬──────────────────────────────────────┐
//!          │ 0x00     │ per-opcode layout (see ReplyLayout)  │
//!          └──────────┴──────────────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{self, Encode, Encoder, Writer};
use crate::error::{Result, WireError};
use super::opcode::{Operation, ReplyLayout};
use super::response::Response;
use super::value::{ValueClass, FIXED_VALUE_SIZE, QUALITY_SIZE};

/// Header size: 1 byte opcode + 4 bytes length
pub const HEADER_SIZE: usize = 5;

// =============================================================================
// Requests
// =============================================================================

/// An encoded request, ready to send
#[derive(Debug, Clone)]
pub struct Request {
    code: u8,
    name: &'static str,
    layout: ReplyLayout,
    class: Option<ValueClass>,
    pre_login: bool,
    frame: Bytes,
}

impl Request {
    /// A request made of the opcode byte alone
    pub fn bare<O: Operation>(op: O) -> Self {
        Self {
            code: op.code(),
            name: op.name(),
            layout: op.reply_layout(),
            class: None,
            pre_login: op.allowed_before_login(),
            frame: Bytes::copy_from_slice(&[op.code()]),
        }
    }

    /// Opcode + length + payload, sized and encoded in one allocation
    pub fn new<O: Operation, P: Encode + ?Sized>(op: O, payload: &P) -> Result<Self> {
        let payload_len = codec::size_of(payload);
        let declared = i32::try_from(payload_len).map_err(|_| {
            WireError::Protocol(format!(
                "{} payload too large: {} bytes",
                op.name(),
                payload_len
            ))
        })?;

        let mut enc = Encoder::with_size(HEADER_SIZE + payload_len);
        enc.put_u8(op.code());
        enc.put_i32(declared);
        payload.encode(&mut enc);

        Ok(Self {
            code: op.code(),
            name: op.name(),
            layout: op.reply_layout(),
            class: None,
            pre_login: op.allowed_before_login(),
            frame: enc.finish()?,
        })
    }

    /// Value class needed to read an inline-row reply
    pub fn with_class(mut self, class: ValueClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    /// Command name used to tag server errors
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn layout(&self) -> ReplyLayout {
        self.layout
    }

    pub fn class(&self) -> Option<ValueClass> {
        self.class
    }

    /// Handshake step, valid on a connection that is not yet logged in
    pub fn is_pre_login(&self) -> bool {
        self.pre_login
    }

    /// The complete frame
    pub fn frame(&self) -> &Bytes {
        &self.frame
    }

    /// Payload length declared in the frame (0 for bare requests)
    pub fn payload_len(&self) -> usize {
        self.frame.len().saturating_sub(HEADER_SIZE)
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(request.frame())?;
    writer.flush()?;
    Ok(())
}

/// Read one complete response from a stream
///
/// Blocks until the whole frame has arrived: every header field is read
/// with `read_exact`, then exactly the declared payload, no matter how the
/// bytes are split across socket reads.
pub fn read_response<R: Read>(
    reader: &mut R,
    layout: ReplyLayout,
    class: Option<ValueClass>,
    max_payload: usize,
) -> Result<Response> {
    let status = read_u8(reader)?;

    if status != 0 {
        let len = read_length(reader, max_payload)?;
        let payload = read_exact_bytes(reader, len)?;
        return Ok(Response::failed(status, payload));
    }

    match layout {
        ReplyLayout::StatusOnly => Ok(Response::ok(Bytes::new())),
        ReplyLayout::LengthPrefixed => {
            let len = read_length(reader, max_payload)?;
            Ok(Response::ok(read_exact_bytes(reader, len)?))
        }
        ReplyLayout::InlineRow => {
            let class = class.ok_or_else(|| {
                WireError::Protocol("inline row reply read without a value class".to_string())
            })?;
            read_inline_row(reader, class, max_payload).map(Response::ok)
        }
    }
}

/// Reassemble `timestamp(8) + value + quality(4)` field by field
fn read_inline_row<R: Read>(reader: &mut R, class: ValueClass, max_payload: usize) -> Result<Bytes> {
    let mut row = BytesMut::with_capacity(8 + FIXED_VALUE_SIZE + QUALITY_SIZE);
    row.put_slice(&read_exact_bytes(reader, 8)?);
    match class {
        ValueClass::Fixed => row.put_slice(&read_exact_bytes(reader, FIXED_VALUE_SIZE)?),
        ValueClass::Blob => {
            let len = read_length(reader, max_payload)?;
            row.put_i32(len as i32);
            row.put_slice(&read_exact_bytes(reader, len)?);
        }
    }
    row.put_slice(&read_exact_bytes(reader, QUALITY_SIZE)?);
    Ok(row.freeze())
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read and validate a 4-byte signed length
fn read_length<R: Read>(reader: &mut R, max_payload: usize) -> Result<usize> {
    let mut raw = [0u8; 4];
    reader.read_exact(&mut raw)?;
    let len = i32::from_be_bytes(raw);

    if len < 0 {
        return Err(WireError::Protocol(format!("Negative payload length: {}", len)));
    }
    if len as usize > max_payload {
        return Err(WireError::Protocol(format!(
            "Response payload too large: {} bytes (max {})",
            len, max_payload
        )));
    }
    Ok(len as usize)
}

fn read_exact_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Bytes> {
    let mut payload = vec![0u8; len];
    if len > 0 {
        reader.read_exact(&mut payload)?;
    }
    Ok(Bytes::from(payload))
}

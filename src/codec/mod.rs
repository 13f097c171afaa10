//! Codec Module
//!
//! Byte-level serialization of every primitive field on the wire.
//!
//! ## Responsibilities
//! - `Sizer`: computes the exact byte length of a field sequence
//! - `Encoder`: writes the same sequence into a buffer of exactly that length
//! - `Decoder`: reads the sequence back, in the same order
//!
//! ## Primitive Layout (big-endian throughout)
//! ```text
//! bool     ┌─────┐
//!          │ 0/1 │                        1 byte
//!          └─────┘
//! string   ┌──────────┬─────────────────┐
//!          │ Len (4)  │ UTF-8 bytes     │ no terminator, no padding
//!          └──────────┴─────────────────┘
//! ints     u8 / i16 / i32 / u32 / i64     fixed width
//! raw      copied verbatim, length implied by context
//! ```
//!
//! Payloads implement [`Encode`] once and are walked by both the sizer and
//! the encoder, so the two passes cannot disagree about the field order.

mod sizer;
mod encoder;
mod decoder;

use bytes::Bytes;

use crate::error::Result;

pub use sizer::Sizer;
pub use encoder::Encoder;
pub use decoder::Decoder;

/// Bytes taken by a string/blob length prefix
pub const LEN_PREFIX_SIZE: usize = 4;

/// A cursor that primitive fields are written through.
///
/// Implemented by [`Sizer`] (counts bytes) and [`Encoder`] (writes bytes).
pub trait Writer {
    fn put_u8(&mut self, value: u8);
    fn put_i16(&mut self, value: i16);
    fn put_i32(&mut self, value: i32);
    fn put_u32(&mut self, value: u32);
    fn put_i64(&mut self, value: i64);

    /// Raw bytes, no length prefix
    fn put_raw(&mut self, bytes: &[u8]);

    fn put_bool(&mut self, value: bool) {
        self.put_u8(value as u8);
    }

    /// Length-prefixed byte run
    fn put_blob(&mut self, bytes: &[u8]) {
        self.put_i32(bytes.len() as i32);
        self.put_raw(bytes);
    }

    /// Length-prefixed UTF-8 string (length counts bytes, not chars)
    fn put_str(&mut self, value: &str) {
        self.put_blob(value.as_bytes());
    }
}

/// A value that can be written field by field through a [`Writer`].
pub trait Encode {
    fn encode<W: Writer>(&self, w: &mut W);
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<W: Writer>(&self, w: &mut W) {
        (**self).encode(w)
    }
}

/// Exact encoded size of `value`.
pub fn size_of<E: Encode + ?Sized>(value: &E) -> usize {
    let mut sizer = Sizer::new();
    value.encode(&mut sizer);
    sizer.size()
}

/// Size, allocate once, encode, and check the buffer was filled exactly.
pub fn encode_exact<E: Encode + ?Sized>(value: &E) -> Result<Bytes> {
    let mut encoder = Encoder::with_size(size_of(value));
    value.encode(&mut encoder);
    encoder.finish()
}

/// Byte length of a length-prefixed string
pub fn str_size(value: &str) -> usize {
    LEN_PREFIX_SIZE + value.len()
}

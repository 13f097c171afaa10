//! Encoder
//!
//! Writes primitive fields into a buffer allocated once at the size the
//! sizer computed. The buffer never grows: a write that would go past the
//! declared size is recorded as an overrun and reported by `finish()`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use super::Writer;

/// Fixed-capacity big-endian writer
#[derive(Debug)]
pub struct Encoder {
    buf: BytesMut,
    limit: usize,
    overrun: usize,
}

impl Encoder {
    /// Create an encoder for exactly `size` bytes
    pub fn with_size(size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(size),
            limit: size,
            overrun: 0,
        }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Bytes left before the declared size is reached
    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    /// Return the encoded bytes, failing on overrun or slack.
    pub fn finish(self) -> Result<Bytes> {
        if self.overrun > 0 {
            return Err(WireError::Protocol(format!(
                "encoder overrun: {} bytes past declared size {}",
                self.overrun, self.limit
            )));
        }
        if self.buf.len() != self.limit {
            return Err(WireError::Protocol(format!(
                "encoder slack: wrote {} of {} declared bytes",
                self.buf.len(),
                self.limit
            )));
        }
        Ok(self.buf.freeze())
    }

    fn fits(&mut self, n: usize) -> bool {
        if self.overrun > 0 || n > self.remaining() {
            self.overrun += n;
            return false;
        }
        true
    }
}

impl Writer for Encoder {
    fn put_u8(&mut self, value: u8) {
        if self.fits(1) {
            self.buf.put_u8(value);
        }
    }

    fn put_i16(&mut self, value: i16) {
        if self.fits(2) {
            self.buf.put_i16(value);
        }
    }

    fn put_i32(&mut self, value: i32) {
        if self.fits(4) {
            self.buf.put_i32(value);
        }
    }

    fn put_u32(&mut self, value: u32) {
        if self.fits(4) {
            self.buf.put_u32(value);
        }
    }

    fn put_i64(&mut self, value: i64) {
        if self.fits(8) {
            self.buf.put_i64(value);
        }
    }

    fn put_raw(&mut self, bytes: &[u8]) {
        if self.fits(bytes.len()) {
            self.buf.put_slice(bytes);
        }
    }
}

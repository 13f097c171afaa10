//! Decoder
//!
//! Reads primitive fields back from a received payload. Every read checks
//! the remaining length first, so a short payload becomes a protocol error
//! instead of a panic.

use bytes::{Buf, Bytes};

use crate::error::{Result, WireError};

/// Big-endian reader over a received payload
#[derive(Debug, Clone)]
pub struct Decoder {
    buf: Bytes,
}

impl Decoder {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// Everything not yet consumed
    pub fn into_remaining(self) -> Bytes {
        self.buf
    }

    fn need(&self, what: &str, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(WireError::truncated(what, n, self.buf.remaining()));
        }
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.need("u8", 1)?;
        Ok(self.buf.get_u8())
    }

    pub fn bool(&mut self) -> Result<bool> {
        Ok(self.u8()? != 0)
    }

    pub fn i16(&mut self) -> Result<i16> {
        self.need("i16", 2)?;
        Ok(self.buf.get_i16())
    }

    pub fn i32(&mut self) -> Result<i32> {
        self.need("i32", 4)?;
        Ok(self.buf.get_i32())
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.need("u32", 4)?;
        Ok(self.buf.get_u32())
    }

    pub fn i64(&mut self) -> Result<i64> {
        self.need("i64", 8)?;
        Ok(self.buf.get_i64())
    }

    /// Exactly `n` raw bytes
    pub fn raw(&mut self, n: usize) -> Result<Bytes> {
        self.need("raw bytes", n)?;
        Ok(self.buf.split_to(n))
    }

    /// Fixed-size raw array (e.g. the 4-byte quality field)
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.need("fixed array", N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// Length-prefixed byte run
    pub fn blob(&mut self) -> Result<Bytes> {
        let len = self.i32()?;
        if len < 0 {
            return Err(WireError::Protocol(format!("negative length prefix: {}", len)));
        }
        self.raw(len as usize)
    }

    /// Length-prefixed UTF-8 string
    pub fn string(&mut self) -> Result<String> {
        let bytes = self.blob()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| WireError::Protocol(format!("invalid UTF-8 in string field: {}", e)))
    }
}

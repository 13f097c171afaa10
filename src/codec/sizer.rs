//! Size estimator
//!
//! Counts the bytes a field sequence will occupy without writing anything.

use super::Writer;

/// Byte counter with the same surface as the encoder
#[derive(Debug, Default, Clone, Copy)]
pub struct Sizer {
    size: usize,
}

impl Sizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes counted so far
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Writer for Sizer {
    fn put_u8(&mut self, _: u8) {
        self.size += 1;
    }

    fn put_i16(&mut self, _: i16) {
        self.size += 2;
    }

    fn put_i32(&mut self, _: i32) {
        self.size += 4;
    }

    fn put_u32(&mut self, _: u32) {
        self.size += 4;
    }

    fn put_i64(&mut self, _: i64) {
        self.size += 8;
    }

    fn put_raw(&mut self, bytes: &[u8]) {
        self.size += bytes.len();
    }
}

//! Skip encoding of ascending index lists.
//!
//! Each index is written as one byte `(index - previous) ^ 1`, where
//! `previous` starts at -1. A literal `1` ends the list; it cannot collide
//! with an entry because indices are strictly ascending.

use bitstream::{Reader, Writer};

use crate::error::CodecResult;

/// The list terminator byte.
pub const SKIP_END: u8 = 1;

/// Writes a skip-encoded list one index at a time.
#[derive(Debug, Clone, Copy)]
pub struct SkipEncoder {
    previous: i64,
}

impl Default for SkipEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipEncoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: -1 }
    }

    /// Writes the skip byte for `index`. Indices must be strictly ascending
    /// and at most 254 apart.
    pub fn push(&mut self, writer: &mut Writer, index: u32) {
        let delta = i64::from(index) - self.previous;
        debug_assert!(delta > 0 && delta < 256, "skip indices must ascend");
        writer.write_u8((delta as u8) ^ 1);
        self.previous = i64::from(index);
    }

    /// Writes the terminator.
    pub fn finish(self, writer: &mut Writer) {
        writer.write_u8(SKIP_END);
    }
}

/// Reads a skip-encoded list one index at a time.
#[derive(Debug, Clone, Copy)]
pub struct SkipDecoder {
    previous: i64,
}

impl Default for SkipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: -1 }
    }

    /// Returns the next index, or `None` at the terminator.
    pub fn next_index(&mut self, reader: &mut Reader<'_>) -> CodecResult<Option<u32>> {
        let byte = reader.read_u8()?;
        if byte == SKIP_END {
            return Ok(None);
        }
        let index = self.previous + i64::from(byte ^ 1);
        self.previous = index;
        Ok(Some(index as u32))
    }
}

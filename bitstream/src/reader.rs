//! Byte reader with bounded operations.

use crate::error::{CoderError, CoderResult};
use crate::{zigzag_decode, ANGLE_SCALE, VARINT_MAX_BYTES};

/// A byte reader for decoding protocol messages.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new `Reader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes remaining to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns `true` if there are no more bytes to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the current byte position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> CoderResult<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> CoderResult<u8> {
        let value = self.peek_u8()?;
        self.pos += 1;
        Ok(value)
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> CoderResult<&'a [u8]> {
        self.ensure(len)?;
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Reads an unsigned varint.
    pub fn read_varu32(&mut self) -> CoderResult<u32> {
        let start = self.pos;
        let mut result = 0u32;
        for index in 0..VARINT_MAX_BYTES {
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7F) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(CoderError::InvalidVarint { position: start })
    }

    /// Reads a zigzag signed varint.
    pub fn read_vars32(&mut self) -> CoderResult<i32> {
        Ok(zigzag_decode(self.read_varu32()?))
    }

    /// Reads a little-endian `f32`.
    pub fn read_f32(&mut self) -> CoderResult<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a 1/64-radian fixed-point angle, returned in radians.
    pub fn read_angle(&mut self) -> CoderResult<f32> {
        Ok(self.read_vars32()? as f32 / ANGLE_SCALE)
    }

    /// Reads a null-terminated UTF-8 string.
    pub fn read_string_nt(&mut self) -> CoderResult<&'a str> {
        let start = self.pos;
        let rest = &self.data[start.min(self.data.len())..];
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(CoderError::UnterminatedString { position: start });
        };
        let bytes = &rest[..len];
        let value =
            std::str::from_utf8(bytes).map_err(|_| CoderError::InvalidUtf8 { position: start })?;
        self.pos += len + 1;
        Ok(value)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> CoderResult<&'a str> {
        let start = self.pos;
        let len = self.read_varu32()? as usize;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|_| CoderError::InvalidUtf8 { position: start })
    }

    fn ensure(&self, bytes: usize) -> CoderResult<()> {
        let available = self.remaining();
        if bytes > available {
            return Err(CoderError::EndOfBuffer {
                requested: bytes,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reader() {
        let reader = Reader::new(&[]);
        assert!(reader.is_empty());
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn read_from_empty_fails() {
        let mut reader = Reader::new(&[]);
        let result = reader.read_u8();
        assert!(matches!(result, Err(CoderError::EndOfBuffer { .. })));
    }

    #[test]
    fn read_varu32() {
        let mut reader = Reader::new(&[0xAC, 0x02]);
        assert_eq!(reader.read_varu32().unwrap(), 300);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_vars32() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        assert_eq!(reader.read_vars32().unwrap(), -1);
        assert_eq!(reader.read_vars32().unwrap(), 1);
    }

    #[test]
    fn read_varu32_invalid() {
        let mut reader = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        let err = reader.read_varu32().unwrap_err();
        assert_eq!(err, CoderError::InvalidVarint { position: 0 });
    }

    #[test]
    fn read_varu32_truncated() {
        let mut reader = Reader::new(&[0x80, 0x80]);
        let err = reader.read_varu32().unwrap_err();
        assert!(matches!(err, CoderError::EndOfBuffer { .. }));
    }

    #[test]
    fn read_string_nt() {
        let mut reader = Reader::new(b"tank\0rest\0");
        assert_eq!(reader.read_string_nt().unwrap(), "tank");
        assert_eq!(reader.read_string_nt().unwrap(), "rest");
        assert!(reader.is_empty());
    }

    #[test]
    fn read_string_nt_unterminated() {
        let mut reader = Reader::new(b"abc");
        let err = reader.read_string_nt().unwrap_err();
        assert_eq!(err, CoderError::UnterminatedString { position: 0 });
        assert_eq!(reader.position(), 0, "failed reads must not advance");
    }

    #[test]
    fn read_string_invalid_utf8() {
        let mut reader = Reader::new(&[0xFF, 0xFE, 0x00]);
        let err = reader.read_string_nt().unwrap_err();
        assert!(matches!(err, CoderError::InvalidUtf8 { .. }));
    }

    #[test]
    fn read_string_length_overrun() {
        let mut reader = Reader::new(&[5, b'a']);
        let err = reader.read_string().unwrap_err();
        assert!(matches!(
            err,
            CoderError::EndOfBuffer {
                requested: 5,
                available: 1
            }
        ));
    }

    #[test]
    fn peek_does_not_advance() {
        let reader = Reader::new(&[9]);
        assert_eq!(reader.peek_u8().unwrap(), 9);
        assert_eq!(reader.position(), 0);
    }
}

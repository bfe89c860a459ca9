//! Byte writer for encoding protocol messages.

use crate::{zigzag_encode, ANGLE_SCALE};

/// A byte writer that owns its output buffer.
///
/// Each writer holds exactly one message under construction. Call
/// [`finish`](Self::finish) to take the bytes, or [`take`](Self::take) to drain
/// them while keeping the allocation for the next message.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    /// Creates a new empty `Writer`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `Writer` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Discards the message under construction, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Writes raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint (little-endian base-128, high continuation bit).
    pub fn write_varu32(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.bytes.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bytes.push(value as u8);
    }

    /// Writes a zigzag signed varint.
    pub fn write_vars32(&mut self, value: i32) {
        self.write_varu32(zigzag_encode(value));
    }

    /// Writes a little-endian `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an angle in radians as a 1/64-radian fixed-point signed varint.
    pub fn write_angle(&mut self, radians: f32) {
        self.write_vars32((radians * ANGLE_SCALE).round() as i32);
    }

    /// Writes a null-terminated UTF-8 string.
    ///
    /// Output stops at the first embedded NUL; bytes after it could never be
    /// read back.
    pub fn write_string_nt(&mut self, value: &str) {
        let bytes = value.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.bytes.extend_from_slice(&bytes[..end]);
        self.bytes.push(0);
    }

    /// Writes a length-prefixed UTF-8 string (`vu` length, then bytes).
    pub fn write_string(&mut self, value: &str) {
        self.write_varu32(value.len() as u32);
        self.bytes.extend_from_slice(value.as_bytes());
    }

    /// Drains the finished message, keeping the allocation for reuse.
    pub fn take(&mut self) -> Vec<u8> {
        let out = self.bytes.clone();
        self.bytes.clear();
        out
    }

    /// Finishes writing and returns the byte buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        buf.append(&mut self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = Writer::new();
        assert_eq!(writer.len(), 0);
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn varu32_single_byte() {
        let mut writer = Writer::new();
        writer.write_varu32(0);
        writer.write_varu32(127);
        assert_eq!(writer.finish(), vec![0x00, 0x7F]);
    }

    #[test]
    fn varu32_multi_byte() {
        let mut writer = Writer::new();
        writer.write_varu32(300);
        assert_eq!(writer.finish(), vec![0xAC, 0x02]);
    }

    #[test]
    fn varu32_max() {
        let mut writer = Writer::new();
        writer.write_varu32(u32::MAX);
        assert_eq!(writer.finish(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn vars32_zigzag() {
        let mut writer = Writer::new();
        writer.write_vars32(-1);
        writer.write_vars32(1);
        writer.write_vars32(-64);
        assert_eq!(writer.finish(), vec![0x01, 0x02, 0x7F]);
    }

    #[test]
    fn angle_is_fixed_point() {
        let mut writer = Writer::new();
        // 0.5 rad * 64 = 32 -> zigzag 64
        writer.write_angle(0.5);
        assert_eq!(writer.finish(), vec![64]);
    }

    #[test]
    fn string_nt_terminates() {
        let mut writer = Writer::new();
        writer.write_string_nt("ab");
        assert_eq!(writer.finish(), vec![b'a', b'b', 0]);
    }

    #[test]
    fn string_nt_stops_at_embedded_nul() {
        let mut writer = Writer::new();
        writer.write_string_nt("a\0b");
        assert_eq!(writer.finish(), vec![b'a', 0]);
    }

    #[test]
    fn string_length_prefixed() {
        let mut writer = Writer::new();
        writer.write_string("hey");
        assert_eq!(writer.finish(), vec![3, b'h', b'e', b'y']);
    }

    #[test]
    fn f32_little_endian() {
        let mut writer = Writer::new();
        writer.write_f32(1.0);
        assert_eq!(writer.finish(), vec![0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn take_resets_for_next_message() {
        let mut writer = Writer::with_capacity(16);
        writer.write_u8(1);
        assert_eq!(writer.take(), vec![1]);
        assert!(writer.is_empty());
        writer.write_u8(2);
        assert_eq!(writer.as_bytes(), &[2]);
    }

    #[test]
    fn finish_into() {
        let mut writer = Writer::new();
        writer.write_u8(0xAB);

        let mut buf = vec![0x00, 0x11];
        writer.finish_into(&mut buf);
        assert_eq!(buf, vec![0x00, 0x11, 0xAB]);
    }
}

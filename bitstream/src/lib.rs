//! Byte-level coder for the arena wire protocol.
//!
//! This crate provides [`Writer`] and [`Reader`] for the compact encodings the
//! protocol is built from: unsigned varints (`vu`), zigzag signed varints (`vi`),
//! 1/64-radian fixed-point angles, little-endian `f32`, and both null-terminated
//! and length-prefixed strings.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **One buffer per writer** - A writer owns its growable buffer, so two
//!   messages can never interleave inside a shared scratch area.
//! - **No domain knowledge** - This crate knows nothing about entities or fields.
//! - **Explicit errors** - Reads never panic; failures return [`CoderError`].
//!
//! # Example
//!
//! ```
//! use bitstream::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.write_u8(0);
//! writer.write_varu32(300);
//! writer.write_vars32(-2);
//! writer.write_string_nt("arena");
//!
//! let bytes = writer.finish();
//!
//! let mut reader = Reader::new(&bytes);
//! assert_eq!(reader.read_u8().unwrap(), 0);
//! assert_eq!(reader.read_varu32().unwrap(), 300);
//! assert_eq!(reader.read_vars32().unwrap(), -2);
//! assert_eq!(reader.read_string_nt().unwrap(), "arena");
//! ```

mod error;
mod reader;
mod writer;

pub use error::{CoderError, CoderResult};
pub use reader::Reader;
pub use writer::Writer;

/// Fixed-point scale for angles: one unit is 1/64 radian.
pub const ANGLE_SCALE: f32 = 64.0;

/// Maximum encoded length of a `u32` varint.
pub const VARINT_MAX_BYTES: usize = 5;

/// Maps a signed value onto the unsigned varint space (zigzag).
#[must_use]
pub const fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[must_use]
pub const fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Returns the number of bytes `value` occupies as a varint.
#[must_use]
pub const fn varu32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x001F_FFFF => 3,
        0x0020_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

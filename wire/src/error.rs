//! Error types for wire operations.

use std::fmt;

use bitstream::CoderError;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while decoding an inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// Underlying byte decoding failed.
    Coder(CoderError),

    /// Packet had no header byte.
    EmptyPacket,

    /// Header byte does not name a known server-bound packet.
    UnknownHeader { header: u8 },

    /// Packet exceeds the configured size limit.
    PacketTooLarge { limit: usize, actual: usize },

    /// A string field exceeds the configured size limit.
    StringTooLong { limit: usize, actual: usize },

    /// Bytes remained after the message body was parsed.
    TrailingBytes { remaining: usize },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coder(err) => write!(f, "coder error: {err}"),
            Self::EmptyPacket => write!(f, "empty packet"),
            Self::UnknownHeader { header } => write!(f, "unknown header 0x{header:02X}"),
            Self::PacketTooLarge { limit, actual } => {
                write!(f, "packet too large: {actual} bytes > {limit}")
            }
            Self::StringTooLong { limit, actual } => {
                write!(f, "string too long: {actual} bytes > {limit}")
            }
            Self::TrailingBytes { remaining } => {
                write!(f, "{remaining} trailing bytes after message body")
            }
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Coder(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoderError> for WireError {
    fn from(err: CoderError) -> Self {
        Self::Coder(err)
    }
}

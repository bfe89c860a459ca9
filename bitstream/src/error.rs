//! Error types for coder operations.

use std::fmt;

/// Result type for coder operations.
pub type CoderResult<T> = Result<T, CoderError>;

/// Errors that can occur while decoding bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoderError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// A varint did not terminate within five bytes.
    InvalidVarint {
        /// Byte offset where the varint started.
        position: usize,
    },

    /// A null-terminated string ran to the end of the buffer.
    UnterminatedString {
        /// Byte offset where the string started.
        position: usize,
    },

    /// String bytes were not valid UTF-8.
    InvalidUtf8 {
        /// Byte offset where the string started.
        position: usize,
    },
}

impl fmt::Display for CoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes but only {available} bytes available"
                )
            }
            Self::InvalidVarint { position } => {
                write!(f, "varint at byte {position} exceeds 5 bytes")
            }
            Self::UnterminatedString { position } => {
                write!(f, "string at byte {position} has no null terminator")
            }
            Self::InvalidUtf8 { position } => {
                write!(f, "string at byte {position} is not valid utf-8")
            }
        }
    }
}

impl std::error::Error for CoderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_end_of_buffer() {
        let err = CoderError::EndOfBuffer {
            requested: 4,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("4 bytes"), "should mention requested bytes");
        assert!(msg.contains("3 bytes"), "should mention available bytes");
    }

    #[test]
    fn error_display_positions() {
        assert!(CoderError::InvalidVarint { position: 9 }
            .to_string()
            .contains("byte 9"));
        assert!(CoderError::UnterminatedString { position: 2 }
            .to_string()
            .contains("null terminator"));
        assert!(CoderError::InvalidUtf8 { position: 0 }
            .to_string()
            .contains("utf-8"));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<CoderError>();
    }
}

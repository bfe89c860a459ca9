//! Limits for update packet decoding.

/// Codec-specific limits enforced while decoding update packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum number of delete references in one packet.
    pub max_deletes: usize,
    /// Maximum number of creation plus update records in one packet.
    pub max_records: usize,
    /// Maximum length of a decoded string value in bytes.
    pub max_string_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_deletes: 16 * 1024,
            max_records: 16 * 1024,
            max_string_bytes: 1024,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_deletes: 32,
            max_records: 32,
            max_string_bytes: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_deletes: usize::MAX,
            max_records: usize::MAX,
            max_string_bytes: usize::MAX,
        }
    }
}

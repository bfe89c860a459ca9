//! Configurable limits for bounded decoding of inbound messages.

/// Wire-level limits for inbound packet decoding.
///
/// These limits are enforced before a message is cached so a misbehaving
/// client cannot grow server memory between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum inbound packet size in bytes.
    pub max_packet_bytes: usize,

    /// Maximum length of any string field in bytes.
    pub max_string_bytes: usize,

    /// Maximum number of queued messages per header between two ticks.
    pub max_queued_per_header: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_packet_bytes: 4 * 1024,
            max_string_bytes: 256,
            max_queued_per_header: 32,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_packet_bytes: 256,
            max_string_bytes: 32,
            max_queued_per_header: 4,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_packet_bytes: usize::MAX,
            max_string_bytes: usize::MAX,
            max_queued_per_header: usize::MAX,
        }
    }
}

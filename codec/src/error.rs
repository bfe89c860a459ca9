//! Error types for record and packet encoding.

use std::fmt;

use bitstream::CoderError;
use schema::{FieldCodec, FieldId, GroupId};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding update packets.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Byte-level decoding failed.
    Coder(CoderError),

    /// The packet does not start with the update header.
    UnexpectedHeader { found: u8 },

    /// A decode limit was exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// A group table names an unassigned group id.
    UnknownGroup { id: u8 },

    /// A skip-encoded index points past the field table.
    UnknownField { index: u32 },

    /// Group ids in a creation record are not strictly ascending.
    GroupsOutOfOrder { group: GroupId },

    /// Fields in an update record are not strictly ascending.
    FieldsOutOfOrder { field: FieldId },

    /// Creation record fields do not match its group table.
    CreationFieldMismatch {
        expected: Option<FieldId>,
        found: Option<FieldId>,
    },

    /// A value does not match its field's encoding.
    ValueMismatch {
        field: FieldId,
        codec: FieldCodec,
        found: &'static str,
    },

    /// A table slot is out of range or out of order.
    InvalidTableSlot { field: FieldId, slot: u32 },

    /// The byte after an entity reference is neither a creation nor an
    /// update marker.
    InvalidRecordMarker { byte: u8 },

    /// Bytes remain after the last record.
    TrailingBytes { remaining: usize },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Deletes,
    Records,
    StringBytes,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coder(e) => write!(f, "coder error: {e}"),
            Self::UnexpectedHeader { found } => {
                write!(f, "expected update header 0x00, found 0x{found:02X}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => write!(f, "{kind} limit exceeded: {actual} > {limit}"),
            Self::UnknownGroup { id } => write!(f, "unknown group id {id}"),
            Self::UnknownField { index } => write!(f, "unknown field index {index}"),
            Self::GroupsOutOfOrder { group } => {
                write!(f, "group {group:?} out of ascending order")
            }
            Self::FieldsOutOfOrder { field } => {
                write!(f, "field {field:?} out of ascending order")
            }
            Self::CreationFieldMismatch { expected, found } => {
                write!(f, "creation record expected {expected:?}, found {found:?}")
            }
            Self::ValueMismatch {
                field,
                codec,
                found,
            } => write!(f, "field {field:?} is {codec:?} but value is {found}"),
            Self::InvalidTableSlot { field, slot } => {
                write!(f, "invalid slot {slot} for table {field:?}")
            }
            Self::InvalidRecordMarker { byte } => {
                write!(f, "invalid record marker 0x{byte:02X}")
            }
            Self::TrailingBytes { remaining } => {
                write!(f, "{remaining} trailing bytes after last record")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deletes => "deletes",
            Self::Records => "records",
            Self::StringBytes => "string bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Coder(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoderError> for CodecError {
    fn from(err: CoderError) -> Self {
        Self::Coder(err)
    }
}

//! Schema validation errors.

use std::fmt;

use crate::{FieldId, GroupId};

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors reported when validating the compiled field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The same group id appears twice in the group table.
    DuplicateGroupId { id: GroupId },

    /// A field's position in the table does not match its global index.
    FieldIndexMismatch { field: FieldId, position: usize },

    /// A group lists its fields out of ascending index order.
    FieldsOutOfOrder { group: GroupId, field: FieldId },

    /// A group lists a field that the field table assigns to another group.
    GroupMismatch { field: FieldId, group: GroupId },

    /// A field is not listed by any group.
    OrphanField { field: FieldId },

    /// A group has no fields.
    EmptyGroup { group: GroupId },

    /// Table fields hold 8 or 10 slots.
    InvalidTableCapacity { field: FieldId, capacity: u8 },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGroupId { id } => write!(f, "duplicate group id {id:?}"),
            Self::FieldIndexMismatch { field, position } => {
                write!(f, "field {field:?} stored at position {position}")
            }
            Self::FieldsOutOfOrder { group, field } => {
                write!(f, "group {group:?} lists {field:?} out of order")
            }
            Self::GroupMismatch { field, group } => {
                write!(f, "field {field:?} listed by foreign group {group:?}")
            }
            Self::OrphanField { field } => write!(f, "field {field:?} belongs to no group"),
            Self::EmptyGroup { group } => write!(f, "group {group:?} has no fields"),
            Self::InvalidTableCapacity { field, capacity } => {
                write!(f, "table field {field:?} has capacity {capacity}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

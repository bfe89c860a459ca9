//! Error types for the simulation core.

use std::fmt;

use schema::GroupId;

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors surfaced by the simulation core.
///
/// Stale entity references are not errors; they resolve to "missing"
/// through the hash check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Every entity slot is in use.
    OutOfEntities { capacity: u32 },

    /// An object entity was inserted without a required group.
    MissingFieldGroup { group: GroupId },

    /// The configuration file could not be read.
    ConfigRead { path: String, message: String },

    /// The configuration JSON is malformed.
    ConfigParse { message: String },

    /// The configuration is well-formed but unusable.
    InvalidConfig { reason: &'static str },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfEntities { capacity } => {
                write!(f, "out of entity slots ({capacity} in use)")
            }
            Self::MissingFieldGroup { group } => {
                write!(f, "object entity is missing the {group:?} group")
            }
            Self::ConfigRead { path, message } => {
                write!(f, "failed to read config {path}: {message}")
            }
            Self::ConfigParse { message } => write!(f, "invalid config json: {message}"),
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for WorldError {}

impl From<serde_json::Error> for WorldError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_out_of_entities() {
        let msg = WorldError::OutOfEntities { capacity: 16_384 }.to_string();
        assert!(msg.contains("16384"), "{msg}");
    }

    #[test]
    fn display_missing_group() {
        let msg = WorldError::MissingFieldGroup {
            group: GroupId::Physics,
        }
        .to_string();
        assert!(msg.contains("Physics"), "{msg}");
    }

    #[test]
    fn from_json_error() {
        let err: WorldError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, WorldError::ConfigParse { .. }));
    }
}

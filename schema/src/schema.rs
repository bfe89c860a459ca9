//! Field groups and validation of the compiled table.

use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldId, FieldShape, FIELDS, FIELD_COUNT};

/// Field group identifier as written in creation records.
///
/// Ids are sparse; id 4 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum GroupId {
    Relations = 0,
    Barrel = 1,
    Physics = 2,
    Health = 3,
    Arena = 5,
    Name = 6,
    Camera = 7,
    Position = 8,
    Style = 9,
    Score = 10,
    Team = 11,
}

impl GroupId {
    /// All groups in ascending id order.
    pub const ALL: [Self; 11] = [
        Self::Relations,
        Self::Barrel,
        Self::Physics,
        Self::Health,
        Self::Arena,
        Self::Name,
        Self::Camera,
        Self::Position,
        Self::Style,
        Self::Score,
        Self::Team,
    ];

    /// Returns the wire id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Parses a wire id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Relations),
            1 => Some(Self::Barrel),
            2 => Some(Self::Physics),
            3 => Some(Self::Health),
            5 => Some(Self::Arena),
            6 => Some(Self::Name),
            7 => Some(Self::Camera),
            8 => Some(Self::Position),
            9 => Some(Self::Style),
            10 => Some(Self::Score),
            11 => Some(Self::Team),
            _ => None,
        }
    }

    /// Returns the group's fields in ascending index order.
    #[must_use]
    pub fn fields(self) -> &'static [FieldId] {
        self.def().fields
    }

    /// Returns the table entry for this group.
    #[must_use]
    pub fn def(self) -> &'static GroupDef {
        &GROUPS[self.position()]
    }

    /// Position in [`GroupId::ALL`] and [`GROUPS`].
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::Relations => 0,
            Self::Barrel => 1,
            Self::Physics => 2,
            Self::Health => 3,
            Self::Arena => 4,
            Self::Name => 5,
            Self::Camera => 6,
            Self::Position => 7,
            Self::Style => 8,
            Self::Score => 9,
            Self::Team => 10,
        }
    }
}

/// One row of the group table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupDef {
    pub id: GroupId,
    pub name: &'static str,
    pub fields: &'static [FieldId],
}

use crate::field::FieldId as F;

/// Every group in ascending id order.
pub static GROUPS: [GroupDef; 11] = [
    GroupDef {
        id: GroupId::Relations,
        name: "relations",
        fields: &[F::Parent, F::Owner, F::Team],
    },
    GroupDef {
        id: GroupId::Barrel,
        name: "barrel",
        fields: &[F::BarrelFlags, F::ReloadTime, F::TrapezoidDirection],
    },
    GroupDef {
        id: GroupId::Physics,
        name: "physics",
        fields: &[
            F::PhysicsFlags,
            F::Sides,
            F::Size,
            F::Width,
            F::Absorption,
            F::Push,
        ],
    },
    GroupDef {
        id: GroupId::Health,
        name: "health",
        fields: &[F::HealthFlags, F::Health, F::MaxHealth],
    },
    GroupDef {
        id: GroupId::Arena,
        name: "arena",
        fields: &[
            F::ArenaFlags,
            F::LeftX,
            F::TopY,
            F::RightX,
            F::BottomY,
            F::ScoreboardAmount,
            F::ScoreboardNames,
            F::ScoreboardScores,
            F::ScoreboardColors,
            F::ScoreboardSuffixes,
            F::PlayersNeeded,
            F::TicksUntilStart,
            F::LeaderX,
            F::LeaderY,
        ],
    },
    GroupDef {
        id: GroupId::Name,
        name: "name",
        fields: &[F::NameFlags, F::Name],
    },
    GroupDef {
        id: GroupId::Camera,
        name: "camera",
        fields: &[
            F::Player,
            F::Fov,
            F::Level,
            F::Tank,
            F::LevelbarProgress,
            F::LevelbarMax,
            F::StatsAvailable,
            F::StatNames,
            F::StatLevels,
            F::StatLimits,
            F::MovementSpeed,
            F::ScoreBar,
            F::CameraX,
            F::CameraY,
            F::CameraFlags,
        ],
    },
    GroupDef {
        id: GroupId::Position,
        name: "position",
        fields: &[F::X, F::Y, F::Angle, F::PositionFlags],
    },
    GroupDef {
        id: GroupId::Style,
        name: "style",
        fields: &[
            F::StyleFlags,
            F::Color,
            F::BorderWidth,
            F::Opacity,
            F::ZIndex,
        ],
    },
    GroupDef {
        id: GroupId::Score,
        name: "score",
        fields: &[F::Score],
    },
    GroupDef {
        id: GroupId::Team,
        name: "team",
        fields: &[F::TeamColor, F::TeamFlags],
    },
];

/// Checks the invariants the record codec relies on.
///
/// - field table position equals global index
/// - every group is non-empty and lists its fields in ascending order
/// - every field is listed by exactly its own group
/// - table capacities are 8 or 10
pub fn validate() -> SchemaResult<()> {
    validate_tables(&GROUPS)
}

pub(crate) fn validate_tables(groups: &[GroupDef]) -> SchemaResult<()> {
    for (position, def) in FIELDS.iter().enumerate() {
        if usize::from(def.id.index()) != position {
            return Err(SchemaError::FieldIndexMismatch {
                field: def.id,
                position,
            });
        }
        if let FieldShape::Table { capacity } = def.shape {
            if capacity != 8 && capacity != 10 {
                return Err(SchemaError::InvalidTableCapacity {
                    field: def.id,
                    capacity,
                });
            }
        }
    }

    let mut seen_groups = [false; 256];
    let mut seen_fields = [false; FIELD_COUNT];
    for group in groups {
        let slot = &mut seen_groups[usize::from(group.id.id())];
        if *slot {
            return Err(SchemaError::DuplicateGroupId { id: group.id });
        }
        *slot = true;

        if group.fields.is_empty() {
            return Err(SchemaError::EmptyGroup { group: group.id });
        }
        let mut previous: Option<FieldId> = None;
        for &field in group.fields {
            if previous.is_some_and(|p| p >= field) {
                return Err(SchemaError::FieldsOutOfOrder {
                    group: group.id,
                    field,
                });
            }
            previous = Some(field);
            if field.def().group != group.id {
                return Err(SchemaError::GroupMismatch {
                    field,
                    group: group.id,
                });
            }
            seen_fields[usize::from(field.index())] = true;
        }
    }

    if let Some(position) = seen_fields.iter().position(|seen| !seen) {
        return Err(SchemaError::OrphanField {
            field: FIELDS[position].id,
        });
    }
    Ok(())
}

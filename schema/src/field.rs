//! Field encodings and the global field table.

use crate::GroupId;

/// Wire encoding of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldCodec {
    /// Unsigned base-128 varint.
    VarUInt,
    /// Zigzag varint.
    VarSInt,
    /// Little-endian IEEE 754 single.
    Float32,
    /// Radians as a zigzag varint of `round(radians * 64)`.
    Angle,
    /// Null-terminated UTF-8.
    String,
    /// Weak entity reference (hash then id, or a single zero byte).
    EntityRef,
}

impl FieldCodec {
    /// Stable tag used by the schema fingerprint.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::VarUInt => 0,
            Self::VarSInt => 1,
            Self::Float32 => 2,
            Self::Angle => 3,
            Self::String => 4,
            Self::EntityRef => 5,
        }
    }
}

/// Scalar fields hold one value; table fields hold a fixed number of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldShape {
    Scalar,
    Table { capacity: u8 },
}

/// Global field identifier.
///
/// The discriminant is the field's global index; records emit fields in
/// ascending index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FieldId {
    Parent = 0,
    Owner,
    Team,
    BarrelFlags,
    ReloadTime,
    TrapezoidDirection,
    PhysicsFlags,
    Sides,
    Size,
    Width,
    Absorption,
    Push,
    HealthFlags,
    Health,
    MaxHealth,
    ArenaFlags,
    LeftX,
    TopY,
    RightX,
    BottomY,
    ScoreboardAmount,
    ScoreboardNames,
    ScoreboardScores,
    ScoreboardColors,
    ScoreboardSuffixes,
    PlayersNeeded,
    TicksUntilStart,
    LeaderX,
    LeaderY,
    NameFlags,
    Name,
    Player,
    Fov,
    Level,
    Tank,
    LevelbarProgress,
    LevelbarMax,
    StatsAvailable,
    StatNames,
    StatLevels,
    StatLimits,
    MovementSpeed,
    ScoreBar,
    CameraX,
    CameraY,
    CameraFlags,
    X,
    Y,
    Angle,
    PositionFlags,
    StyleFlags,
    Color,
    BorderWidth,
    Opacity,
    ZIndex,
    Score,
    TeamColor,
    TeamFlags,
}

/// Number of fields in the protocol.
pub const FIELD_COUNT: usize = 58;

impl FieldId {
    /// Returns the global index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Looks up a field by global index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        FIELDS.get(usize::from(index)).map(|def| def.id)
    }

    /// Returns the table entry for this field.
    #[must_use]
    pub fn def(self) -> &'static FieldDef {
        &FIELDS[self as usize]
    }
}

/// One row of the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldDef {
    pub id: FieldId,
    pub group: GroupId,
    pub codec: FieldCodec,
    pub shape: FieldShape,
    pub name: &'static str,
}

impl FieldDef {
    const fn scalar(id: FieldId, group: GroupId, codec: FieldCodec, name: &'static str) -> Self {
        Self {
            id,
            group,
            codec,
            shape: FieldShape::Scalar,
            name,
        }
    }

    const fn table(
        id: FieldId,
        group: GroupId,
        codec: FieldCodec,
        capacity: u8,
        name: &'static str,
    ) -> Self {
        Self {
            id,
            group,
            codec,
            shape: FieldShape::Table { capacity },
            name,
        }
    }

    /// Returns the slot count for table fields.
    #[must_use]
    pub const fn table_capacity(&self) -> Option<u8> {
        match self.shape {
            FieldShape::Scalar => None,
            FieldShape::Table { capacity } => Some(capacity),
        }
    }
}

use self::FieldCodec::{
    Angle as A, EntityRef as E, Float32 as F, String as S, VarSInt as I, VarUInt as U,
};
use crate::GroupId as G;

/// Every field in ascending global index order.
pub static FIELDS: [FieldDef; FIELD_COUNT] = [
    FieldDef::scalar(FieldId::Parent, G::Relations, E, "parent"),
    FieldDef::scalar(FieldId::Owner, G::Relations, E, "owner"),
    FieldDef::scalar(FieldId::Team, G::Relations, E, "team"),
    FieldDef::scalar(FieldId::BarrelFlags, G::Barrel, U, "barrel_flags"),
    FieldDef::scalar(FieldId::ReloadTime, G::Barrel, F, "reload_time"),
    FieldDef::scalar(FieldId::TrapezoidDirection, G::Barrel, F, "trapezoid_direction"),
    FieldDef::scalar(FieldId::PhysicsFlags, G::Physics, U, "physics_flags"),
    FieldDef::scalar(FieldId::Sides, G::Physics, U, "sides"),
    FieldDef::scalar(FieldId::Size, G::Physics, F, "size"),
    FieldDef::scalar(FieldId::Width, G::Physics, F, "width"),
    FieldDef::scalar(FieldId::Absorption, G::Physics, F, "absorption"),
    FieldDef::scalar(FieldId::Push, G::Physics, F, "push"),
    FieldDef::scalar(FieldId::HealthFlags, G::Health, U, "health_flags"),
    FieldDef::scalar(FieldId::Health, G::Health, F, "health"),
    FieldDef::scalar(FieldId::MaxHealth, G::Health, F, "max_health"),
    FieldDef::scalar(FieldId::ArenaFlags, G::Arena, U, "arena_flags"),
    FieldDef::scalar(FieldId::LeftX, G::Arena, F, "left_x"),
    FieldDef::scalar(FieldId::TopY, G::Arena, F, "top_y"),
    FieldDef::scalar(FieldId::RightX, G::Arena, F, "right_x"),
    FieldDef::scalar(FieldId::BottomY, G::Arena, F, "bottom_y"),
    FieldDef::scalar(FieldId::ScoreboardAmount, G::Arena, U, "scoreboard_amount"),
    FieldDef::table(FieldId::ScoreboardNames, G::Arena, S, 10, "scoreboard_names"),
    FieldDef::table(FieldId::ScoreboardScores, G::Arena, F, 10, "scoreboard_scores"),
    FieldDef::table(FieldId::ScoreboardColors, G::Arena, U, 10, "scoreboard_colors"),
    FieldDef::table(FieldId::ScoreboardSuffixes, G::Arena, S, 10, "scoreboard_suffixes"),
    FieldDef::scalar(FieldId::PlayersNeeded, G::Arena, I, "players_needed"),
    FieldDef::scalar(FieldId::TicksUntilStart, G::Arena, F, "ticks_until_start"),
    FieldDef::scalar(FieldId::LeaderX, G::Arena, F, "leader_x"),
    FieldDef::scalar(FieldId::LeaderY, G::Arena, F, "leader_y"),
    FieldDef::scalar(FieldId::NameFlags, G::Name, U, "name_flags"),
    FieldDef::scalar(FieldId::Name, G::Name, S, "name"),
    FieldDef::scalar(FieldId::Player, G::Camera, E, "player"),
    FieldDef::scalar(FieldId::Fov, G::Camera, F, "fov"),
    FieldDef::scalar(FieldId::Level, G::Camera, U, "level"),
    FieldDef::scalar(FieldId::Tank, G::Camera, I, "tank"),
    FieldDef::scalar(FieldId::LevelbarProgress, G::Camera, F, "levelbar_progress"),
    FieldDef::scalar(FieldId::LevelbarMax, G::Camera, F, "levelbar_max"),
    FieldDef::scalar(FieldId::StatsAvailable, G::Camera, U, "stats_available"),
    FieldDef::table(FieldId::StatNames, G::Camera, S, 8, "stat_names"),
    FieldDef::table(FieldId::StatLevels, G::Camera, U, 8, "stat_levels"),
    FieldDef::table(FieldId::StatLimits, G::Camera, U, 8, "stat_limits"),
    FieldDef::scalar(FieldId::MovementSpeed, G::Camera, F, "movement_speed"),
    FieldDef::scalar(FieldId::ScoreBar, G::Camera, F, "score_bar"),
    FieldDef::scalar(FieldId::CameraX, G::Camera, F, "camera_x"),
    FieldDef::scalar(FieldId::CameraY, G::Camera, F, "camera_y"),
    FieldDef::scalar(FieldId::CameraFlags, G::Camera, U, "camera_flags"),
    FieldDef::scalar(FieldId::X, G::Position, F, "x"),
    FieldDef::scalar(FieldId::Y, G::Position, F, "y"),
    FieldDef::scalar(FieldId::Angle, G::Position, A, "angle"),
    FieldDef::scalar(FieldId::PositionFlags, G::Position, U, "position_flags"),
    FieldDef::scalar(FieldId::StyleFlags, G::Style, U, "style_flags"),
    FieldDef::scalar(FieldId::Color, G::Style, U, "color"),
    FieldDef::scalar(FieldId::BorderWidth, G::Style, F, "border_width"),
    FieldDef::scalar(FieldId::Opacity, G::Style, F, "opacity"),
    FieldDef::scalar(FieldId::ZIndex, G::Style, U, "z_index"),
    FieldDef::scalar(FieldId::Score, G::Score, F, "score"),
    FieldDef::scalar(FieldId::TeamColor, G::Team, U, "team_color"),
    FieldDef::scalar(FieldId::TeamFlags, G::Team, U, "team_flags"),
];

//! Field groups: typed field storage with per-field dirty tracking.
//!
//! Each group is a plain struct generated by [`field_group!`]. Reads go
//! through getters on the struct; writes go through a guard that also holds
//! the owning entity's [`EntityState`], so every effective change marks the
//! entity for update in the same call. Writing the current value is a no-op.
//!
//! Float fields compare with `==`, so a NaN never equals itself and writing
//! NaN marks the field dirty on every call.

use std::ops::Deref;

use codec::{EntityRef, FieldValue};
use repgraph::EntityState;
use schema::{FieldId, GroupId};

#[derive(Debug, Clone, Default)]
pub(crate) struct Field<T> {
    value: T,
    dirty: bool,
}

impl<T: PartialEq> Field<T> {
    const fn new(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }

    fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.dirty = true;
        true
    }
}

impl Field<String> {
    fn set_str(&mut self, value: &str) -> bool {
        if self.value == value {
            return false;
        }
        value.clone_into(&mut self.value);
        self.dirty = true;
        true
    }
}

/// Fixed-capacity array field with one dirty bit per slot.
#[derive(Debug, Clone)]
pub(crate) struct Table<T, const N: usize> {
    values: [T; N],
    dirty: u16,
}

impl<T: Default, const N: usize> Default for Table<T, N> {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|_| T::default()),
            dirty: 0,
        }
    }
}

impl<T: PartialEq, const N: usize> Table<T, N> {
    fn set(&mut self, slot: usize, value: T) -> bool {
        let Some(current) = self.values.get_mut(slot) else {
            return false;
        };
        if *current == value {
            return false;
        }
        *current = value;
        self.dirty |= 1 << slot;
        true
    }
}

impl<const N: usize> Table<String, N> {
    fn set_str(&mut self, slot: usize, value: &str) -> bool {
        let Some(current) = self.values.get_mut(slot) else {
            return false;
        };
        if current == value {
            return false;
        }
        value.clone_into(current);
        self.dirty |= 1 << slot;
        true
    }
}

impl<T, const N: usize> Table<T, N> {
    const fn is_dirty(&self) -> bool {
        self.dirty != 0
    }

    fn slots<F>(&self, only_dirty: bool, to_value: F) -> FieldValue
    where
        F: Fn(&T) -> FieldValue,
    {
        let slots = self
            .values
            .iter()
            .enumerate()
            .filter(|(slot, _)| !only_dirty || self.dirty & (1 << slot) != 0)
            .map(|(slot, value)| (slot as u8, to_value(value)))
            .collect();
        FieldValue::Table(slots)
    }
}

fn clamp_health(value: f32) -> f32 {
    if value < 0.0 {
        tracing::warn!(value, "negative health clamped to zero");
        0.0
    } else {
        value
    }
}

macro_rules! field_getter {
    ($field:ident, String) => {
        pub fn $field(&self) -> &str {
            &self.$field.value
        }
    };
    ($field:ident, $ty:ident) => {
        pub fn $field(&self) -> $ty {
            self.$field.value
        }
    };
}

macro_rules! table_getter {
    ($table:ident, String) => {
        pub fn $table(&self, slot: usize) -> Option<&str> {
            self.$table.values.get(slot).map(String::as_str)
        }
    };
    ($table:ident, $ty:ident) => {
        pub fn $table(&self, slot: usize) -> Option<$ty> {
            self.$table.values.get(slot).copied()
        }
    };
}

macro_rules! field_setter {
    ($field:ident, $setter:ident, String, $($filter:path)?) => {
        pub fn $setter(&mut self, value: &str) {
            if self.group.$field.set_str(value) {
                self.state.insert(EntityState::NEEDS_UPDATE);
            }
        }
    };
    ($field:ident, $setter:ident, $ty:ident, $($filter:path)?) => {
        pub fn $setter(&mut self, value: $ty) {
            $(let value = $filter(value);)?
            if self.group.$field.set(value) {
                self.state.insert(EntityState::NEEDS_UPDATE);
            }
        }
    };
}

macro_rules! table_setter {
    ($table:ident, $setter:ident, String) => {
        pub fn $setter(&mut self, slot: usize, value: &str) {
            if self.group.$table.set_str(slot, value) {
                self.state.insert(EntityState::NEEDS_UPDATE);
            }
        }
    };
    ($table:ident, $setter:ident, $ty:ident) => {
        pub fn $setter(&mut self, slot: usize, value: $ty) {
            if self.group.$table.set(slot, value) {
                self.state.insert(EntityState::NEEDS_UPDATE);
            }
        }
    };
}

macro_rules! wire_value {
    ($variant:ident, String, $value:expr) => {
        FieldValue::$variant($value.clone())
    };
    ($variant:ident, $ty:ident, $value:expr) => {
        FieldValue::$variant(*$value)
    };
}

macro_rules! default_or {
    () => {
        Default::default()
    };
    ($default:expr) => {
        $default
    };
}

/// Generates a group struct, its guard, and its record helpers.
///
/// Scalars: `name, setter: Type => ValueVariant @ FieldId [filter] = default;`
/// Tables: `name, setter: [Type; N] => ValueVariant @ FieldId;`
macro_rules! field_group {
    (
        $(#[$meta:meta])*
        $name:ident, $guard:ident, $group:ident {
            $( $field:ident, $setter:ident : $ty:ident => $variant:ident @ $id:ident
                $([$filter:path])? $(= $default:expr)? ; )*
        }
        tables {
            $( $table:ident, $tsetter:ident : [$tty:ident; $cap:literal] => $tvariant:ident @ $tid:ident ; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            $( $field: Field<$ty>, )*
            $( $table: Table<$tty, $cap>, )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: Field::new(default_or!($($default)?)), )*
                    $( $table: Table::default(), )*
                }
            }
        }

        impl $name {
            pub const GROUP: GroupId = GroupId::$group;

            $( field_getter!($field, $ty); )*
            $( table_getter!($table, $tty); )*

            /// Fields changed since the last wipe, in ascending index order.
            ///
            /// A table appears once however many of its slots changed; the
            /// dirty slots themselves are listed by `append_update`.
            pub fn find_update(&self) -> Vec<FieldId> {
                let mut out = Vec::new();
                $( if self.$field.dirty { out.push(FieldId::$id); } )*
                $( if self.$table.is_dirty() { out.push(FieldId::$tid); } )*
                out.sort_unstable();
                out
            }

            /// Clears every dirty bit, keeping values.
            pub fn wipe(&mut self) {
                $( self.$field.dirty = false; )*
                $( self.$table.dirty = 0; )*
            }

            pub(crate) fn append_creation(&self, out: &mut Vec<(FieldId, FieldValue)>) {
                $( out.push((FieldId::$id, wire_value!($variant, $ty, &self.$field.value))); )*
                $( out.push((
                    FieldId::$tid,
                    self.$table.slots(false, |v| wire_value!($tvariant, $tty, v)),
                )); )*
            }

            pub(crate) fn append_update(&self, out: &mut Vec<(FieldId, FieldValue)>) {
                $( if self.$field.dirty {
                    out.push((FieldId::$id, wire_value!($variant, $ty, &self.$field.value)));
                } )*
                $( if self.$table.is_dirty() {
                    out.push((
                        FieldId::$tid,
                        self.$table.slots(true, |v| wire_value!($tvariant, $tty, v)),
                    ));
                } )*
            }
        }

        /// Write access that marks the owning entity on every change.
        #[derive(Debug)]
        pub struct $guard<'a> {
            group: &'a mut $name,
            state: &'a mut EntityState,
        }

        impl<'a> $guard<'a> {
            pub(crate) fn new(group: &'a mut $name, state: &'a mut EntityState) -> Self {
                Self { group, state }
            }

            $( field_setter!($field, $setter, $ty, $($filter)?); )*
            $( table_setter!($table, $tsetter, $tty); )*
        }

        impl Deref for $guard<'_> {
            type Target = $name;

            fn deref(&self) -> &$name {
                self.group
            }
        }
    };
}

field_group! {
    /// Links to the parent, owner, and team entities.
    RelationsGroup, RelationsMut, Relations {
        parent, set_parent: EntityRef => Entity @ Parent;
        owner, set_owner: EntityRef => Entity @ Owner;
        team, set_team: EntityRef => Entity @ Team;
    }
    tables {}
}

field_group! {
    BarrelGroup, BarrelMut, Barrel {
        flags, set_flags: u32 => UInt @ BarrelFlags;
        reload_time, set_reload_time: f32 => Float @ ReloadTime = 15.0;
        trapezoid_direction, set_trapezoid_direction: f32 => Float @ TrapezoidDirection;
    }
    tables {}
}

field_group! {
    /// Collision shape and knockback coefficients.
    ///
    /// `sides == 2` marks a rectangle with half extents `size / 2` by
    /// `width / 2`; anything else collides as a circle of radius `size`.
    PhysicsGroup, PhysicsMut, Physics {
        flags, set_flags: u32 => UInt @ PhysicsFlags;
        sides, set_sides: u32 => UInt @ Sides = 1;
        size, set_size: f32 => Float @ Size = 1.0;
        width, set_width: f32 => Float @ Width;
        absorption, set_absorption: f32 => Float @ Absorption = 1.0;
        push, set_push: f32 => Float @ Push = 8.0;
    }
    tables {}
}

field_group! {
    HealthGroup, HealthMut, Health {
        flags, set_flags: u32 => UInt @ HealthFlags;
        health, set_health: f32 => Float @ Health [clamp_health] = 1.0;
        max_health, set_max_health: f32 => Float @ MaxHealth = 1.0;
    }
    tables {}
}

field_group! {
    /// Arena bounds, scoreboard, and lobby countdown.
    ArenaGroup, ArenaMut, Arena {
        flags, set_flags: u32 => UInt @ ArenaFlags;
        left_x, set_left_x: f32 => Float @ LeftX;
        top_y, set_top_y: f32 => Float @ TopY;
        right_x, set_right_x: f32 => Float @ RightX;
        bottom_y, set_bottom_y: f32 => Float @ BottomY;
        scoreboard_amount, set_scoreboard_amount: u32 => UInt @ ScoreboardAmount;
        players_needed, set_players_needed: i32 => SInt @ PlayersNeeded;
        ticks_until_start, set_ticks_until_start: f32 => Float @ TicksUntilStart;
        leader_x, set_leader_x: f32 => Float @ LeaderX;
        leader_y, set_leader_y: f32 => Float @ LeaderY;
    }
    tables {
        scoreboard_names, set_scoreboard_name: [String; 10] => Str @ ScoreboardNames;
        scoreboard_scores, set_scoreboard_score: [f32; 10] => Float @ ScoreboardScores;
        scoreboard_colors, set_scoreboard_color: [u32; 10] => UInt @ ScoreboardColors;
        scoreboard_suffixes, set_scoreboard_suffix: [String; 10] => Str @ ScoreboardSuffixes;
    }
}

field_group! {
    NameGroup, NameMut, Name {
        flags, set_flags: u32 => UInt @ NameFlags;
        name, set_name: String => Str @ Name;
    }
    tables {}
}

field_group! {
    /// Per-viewer camera state: followed entity, zoom, and stat bars.
    CameraGroup, CameraMut, Camera {
        player, set_player: EntityRef => Entity @ Player;
        fov, set_fov: f32 => Float @ Fov = 1.0;
        level, set_level: u32 => UInt @ Level = 1;
        tank, set_tank: i32 => SInt @ Tank;
        levelbar_progress, set_levelbar_progress: f32 => Float @ LevelbarProgress;
        levelbar_max, set_levelbar_max: f32 => Float @ LevelbarMax;
        stats_available, set_stats_available: u32 => UInt @ StatsAvailable;
        movement_speed, set_movement_speed: f32 => Float @ MovementSpeed = 1.0;
        score_bar, set_score_bar: f32 => Float @ ScoreBar;
        camera_x, set_camera_x: f32 => Float @ CameraX;
        camera_y, set_camera_y: f32 => Float @ CameraY;
        flags, set_flags: u32 => UInt @ CameraFlags;
    }
    tables {
        stat_names, set_stat_name: [String; 8] => Str @ StatNames;
        stat_levels, set_stat_level: [u32; 8] => UInt @ StatLevels;
        stat_limits, set_stat_limit: [u32; 8] => UInt @ StatLimits;
    }
}

field_group! {
    PositionGroup, PositionMut, Position {
        x, set_x: f32 => Float @ X;
        y, set_y: f32 => Float @ Y;
        angle, set_angle: f32 => Angle @ Angle;
        flags, set_flags: u32 => UInt @ PositionFlags;
    }
    tables {}
}

field_group! {
    StyleGroup, StyleMut, Style {
        flags, set_flags: u32 => UInt @ StyleFlags = 1;
        color, set_color: u32 => UInt @ Color;
        border_width, set_border_width: f32 => Float @ BorderWidth = 7.5;
        opacity, set_opacity: f32 => Float @ Opacity = 1.0;
        z_index, set_z_index: u32 => UInt @ ZIndex;
    }
    tables {}
}

field_group! {
    ScoreGroup, ScoreMut, Score {
        score, set_score: f32 => Float @ Score;
    }
    tables {}
}

field_group! {
    TeamGroup, TeamMut, Team {
        team_color, set_team_color: u32 => UInt @ TeamColor;
        flags, set_flags: u32 => UInt @ TeamFlags;
    }
    tables {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> (PositionGroup, EntityState) {
        (PositionGroup::default(), EntityState::default())
    }

    #[test]
    fn setting_same_value_is_noop() {
        let (mut group, mut state) = position();
        PositionMut::new(&mut group, &mut state).set_x(5.0);
        assert_eq!(group.find_update(), vec![FieldId::X]);
        assert!(state.contains(EntityState::NEEDS_UPDATE));

        group.wipe();
        state.clear();
        PositionMut::new(&mut group, &mut state).set_x(5.0);
        assert!(group.find_update().is_empty());
        assert!(state.is_clean());
    }

    #[test]
    fn wipe_keeps_values() {
        let (mut group, mut state) = position();
        PositionMut::new(&mut group, &mut state).set_y(-3.0);
        group.wipe();
        assert!((group.y() + 3.0).abs() < f32::EPSILON);
        assert!(group.find_update().is_empty());
    }

    #[test]
    fn nan_always_marks_dirty() {
        let (mut group, mut state) = position();
        PositionMut::new(&mut group, &mut state).set_x(f32::NAN);
        group.wipe();
        state.clear();
        PositionMut::new(&mut group, &mut state).set_x(f32::NAN);
        assert_eq!(group.find_update(), vec![FieldId::X]);
        assert!(state.contains(EntityState::NEEDS_UPDATE));
    }

    #[test]
    fn find_update_is_index_ordered() {
        let mut group = CameraGroup::default();
        let mut state = EntityState::default();
        let mut guard = CameraMut::new(&mut group, &mut state);
        guard.set_flags(4);
        guard.set_stat_level(2, 3);
        guard.set_fov(0.5);
        assert_eq!(
            group.find_update(),
            vec![FieldId::Fov, FieldId::StatLevels, FieldId::CameraFlags]
        );
    }

    #[test]
    fn table_updates_carry_dirty_slots_only() {
        let mut group = CameraGroup::default();
        let mut state = EntityState::default();
        {
            let mut guard = CameraMut::new(&mut group, &mut state);
            guard.set_stat_level(5, 2);
            guard.set_stat_level(1, 4);
        }
        assert_eq!(group.find_update(), vec![FieldId::StatLevels]);

        let mut update = Vec::new();
        group.append_update(&mut update);
        assert_eq!(
            update,
            vec![(
                FieldId::StatLevels,
                FieldValue::Table(vec![(1, FieldValue::UInt(4)), (5, FieldValue::UInt(2))])
            )]
        );

        let mut creation = Vec::new();
        group.append_creation(&mut creation);
        let levels = creation
            .iter()
            .find(|(field, _)| *field == FieldId::StatLevels)
            .map(|(_, value)| value.clone());
        let Some(FieldValue::Table(slots)) = levels else {
            panic!("stat levels missing");
        };
        assert_eq!(slots.len(), 8);
    }

    #[test]
    fn table_same_value_and_out_of_range_are_noops() {
        let mut group = ArenaGroup::default();
        let mut state = EntityState::default();
        let mut guard = ArenaMut::new(&mut group, &mut state);
        guard.set_scoreboard_name(0, "");
        guard.set_scoreboard_name(10, "overflow");
        assert!(group.find_update().is_empty());
        assert!(state.is_clean());
    }

    #[test]
    fn string_fields() {
        let mut group = NameGroup::default();
        let mut state = EntityState::default();
        NameMut::new(&mut group, &mut state).set_name("player");
        assert_eq!(group.name(), "player");
        let mut update = Vec::new();
        group.append_update(&mut update);
        assert_eq!(update, vec![(FieldId::Name, FieldValue::Str("player".into()))]);
    }

    #[test]
    fn negative_health_is_clamped() {
        let mut group = HealthGroup::default();
        let mut state = EntityState::default();
        HealthMut::new(&mut group, &mut state).set_health(-0.25);
        assert!(group.health().abs() < f32::EPSILON);
    }

    #[test]
    fn defaults_are_visible() {
        let style = StyleGroup::default();
        assert!((style.opacity() - 1.0).abs() < f32::EPSILON);
        assert_eq!(PhysicsGroup::default().sides(), 1);
    }

    #[test]
    fn creation_covers_every_group_field() {
        let mut out = Vec::new();
        ArenaGroup::default().append_creation(&mut out);
        let mut fields: Vec<FieldId> = out.iter().map(|(field, _)| *field).collect();
        fields.sort_unstable();
        assert_eq!(fields, GroupId::Arena.fields());
    }
}

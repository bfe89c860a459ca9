//! Entities: optional field groups plus runtime object state.

use codec::{EntityRef, FieldValue, Tick};
use repgraph::EntityState;
use schema::{FieldId, GroupId};

use crate::fields::{
    ArenaGroup, ArenaMut, BarrelGroup, BarrelMut, CameraGroup, CameraMut, HealthGroup, HealthMut,
    NameGroup, NameMut, PhysicsGroup, PhysicsMut, PositionGroup, PositionMut, RelationsGroup,
    RelationsMut, ScoreGroup, ScoreMut, StyleGroup, StyleMut, TeamGroup, TeamMut,
};

/// Ticks an object fades for after [`crate::World::delete`].
pub const DELETION_ANIMATION_TICKS: u8 = 5;

/// Fade-out countdown run before an object is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionAnimation {
    ticks_left: u8,
}

impl DeletionAnimation {
    pub const fn new() -> Self {
        Self {
            ticks_left: DELETION_ANIMATION_TICKS,
        }
    }

    pub const fn ticks_left(self) -> u8 {
        self.ticks_left
    }

    /// Steps the countdown; returns `true` once it has run out.
    pub fn advance(&mut self) -> bool {
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left == 0
    }
}

impl Default for DeletionAnimation {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime state of a positioned, colliding entity. Never replicated.
#[derive(Debug, Clone, Default)]
pub struct ObjectState {
    /// Position at the start of the last integration; velocity is
    /// `position - reference`.
    pub(crate) ref_x: f32,
    pub(crate) ref_y: f32,
    pub(crate) accel_x: f32,
    pub(crate) accel_y: f32,
    pub(crate) children: Vec<EntityRef>,
    pub(crate) deletion: Option<DeletionAnimation>,
    pub(crate) collisions: Option<(Tick, Vec<EntityRef>)>,
}

impl ObjectState {
    pub fn children(&self) -> &[EntityRef] {
        &self.children
    }

    pub const fn deletion(&self) -> Option<DeletionAnimation> {
        self.deletion
    }

    pub const fn is_being_deleted(&self) -> bool {
        self.deletion.is_some()
    }
}

/// A bundle of field groups owned by one manager slot.
///
/// Groups can be attached at any time but never removed. Attaching a group
/// to an entity that is already in the world flags it for an in-place
/// recreate, since viewers need the new group table.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    state: EntityState,
    registered: bool,
    relations: Option<RelationsGroup>,
    barrel: Option<BarrelGroup>,
    physics: Option<PhysicsGroup>,
    health: Option<HealthGroup>,
    arena: Option<ArenaGroup>,
    name: Option<NameGroup>,
    camera: Option<CameraGroup>,
    position: Option<PositionGroup>,
    style: Option<StyleGroup>,
    score: Option<ScoreGroup>,
    team: Option<TeamGroup>,
    object: Option<ObjectState>,
}

macro_rules! group_access {
    ($( $field:ident, $get_mut:ident, $attach:ident : $group:ident, $guard:ident; )*) => {
        impl Entity {
            $(
                pub const fn $field(&self) -> Option<&$group> {
                    self.$field.as_ref()
                }

                pub fn $get_mut(&mut self) -> Option<$guard<'_>> {
                    let state = &mut self.state;
                    self.$field.as_mut().map(|group| $guard::new(group, state))
                }

                pub fn $attach(&mut self) -> $guard<'_> {
                    if self.$field.is_none() && self.registered {
                        self.state
                            .insert(EntityState::NEEDS_CREATE | EntityState::NEEDS_DELETE);
                    }
                    let group = self.$field.get_or_insert_with(Default::default);
                    $guard::new(group, &mut self.state)
                }
            )*

            /// Attached groups in ascending id order.
            pub fn groups(&self) -> Vec<GroupId> {
                let mut out = Vec::new();
                $( if self.$field.is_some() { out.push($group::GROUP); } )*
                out.sort_unstable();
                out
            }

            /// Dirty fields across every attached group, ascending.
            pub fn find_update(&self) -> Vec<FieldId> {
                let mut out = Vec::new();
                $( if let Some(group) = &self.$field { out.extend(group.find_update()); } )*
                out.sort_unstable();
                out
            }

            pub(crate) fn creation_fields(&self) -> Vec<(FieldId, FieldValue)> {
                let mut out = Vec::new();
                $( if let Some(group) = &self.$field { group.append_creation(&mut out); } )*
                out.sort_by_key(|(field, _)| *field);
                out
            }

            pub(crate) fn update_fields(&self) -> Vec<(FieldId, FieldValue)> {
                let mut out = Vec::new();
                $( if let Some(group) = &self.$field { group.append_update(&mut out); } )*
                out.sort_by_key(|(field, _)| *field);
                out
            }

            /// Clears every dirty bit and the entity state.
            pub fn wipe(&mut self) {
                self.state.clear();
                $( if let Some(group) = &mut self.$field { group.wipe(); } )*
            }
        }
    };
}

group_access! {
    relations, relations_mut, attach_relations: RelationsGroup, RelationsMut;
    barrel, barrel_mut, attach_barrel: BarrelGroup, BarrelMut;
    physics, physics_mut, attach_physics: PhysicsGroup, PhysicsMut;
    health, health_mut, attach_health: HealthGroup, HealthMut;
    arena, arena_mut, attach_arena: ArenaGroup, ArenaMut;
    name, name_mut, attach_name: NameGroup, NameMut;
    camera, camera_mut, attach_camera: CameraGroup, CameraMut;
    position, position_mut, attach_position: PositionGroup, PositionMut;
    style, style_mut, attach_style: StyleGroup, StyleMut;
    score, score_mut, attach_score: ScoreGroup, ScoreMut;
    team, team_mut, attach_team: TeamGroup, TeamMut;
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// An object entity: relations, physics, position, and style groups
    /// plus runtime object state.
    pub fn object() -> Self {
        let mut entity = Self::new();
        entity.attach_relations();
        entity.attach_physics();
        entity.attach_position();
        entity.attach_style();
        entity.with_object()
    }

    /// Adds runtime object state without attaching any group.
    #[must_use]
    pub fn with_object(mut self) -> Self {
        self.object.get_or_insert_with(ObjectState::default);
        self
    }

    pub const fn state(&self) -> EntityState {
        self.state
    }

    pub(crate) fn set_registered(&mut self) {
        self.registered = true;
    }

    pub const fn object_state(&self) -> Option<&ObjectState> {
        self.object.as_ref()
    }

    pub(crate) fn object_state_mut(&mut self) -> Option<&mut ObjectState> {
        self.object.as_mut()
    }

    pub const fn is_object(&self) -> bool {
        self.object.is_some()
    }

    pub const fn is_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn parent(&self) -> EntityRef {
        self.relations
            .as_ref()
            .map_or(EntityRef::NULL, RelationsGroup::parent)
    }

    pub fn is_child(&self) -> bool {
        !self.parent().is_null()
    }

    /// `(x, y)` or the origin for entities without a position.
    pub fn position_xy(&self) -> (f32, f32) {
        self.position
            .as_ref()
            .map_or((0.0, 0.0), |position| (position.x(), position.y()))
    }

    pub fn velocity(&self) -> (f32, f32) {
        match (&self.position, &self.object) {
            (Some(position), Some(object)) => {
                (position.x() - object.ref_x, position.y() - object.ref_y)
            }
            _ => (0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::creation_field_order;

    #[test]
    fn attaching_before_registration_does_not_flag() {
        let mut entity = Entity::new();
        entity.attach_position().set_x(3.0);
        assert!(!entity.state().contains(EntityState::NEEDS_CREATE));
        assert!(entity.state().contains(EntityState::NEEDS_UPDATE));
    }

    #[test]
    fn attaching_after_registration_requests_recreate() {
        let mut entity = Entity::object();
        entity.set_registered();
        entity.attach_score();
        assert!(entity.state().contains(EntityState::NEEDS_CREATE));
        assert!(entity.state().contains(EntityState::NEEDS_DELETE));

        entity.wipe();
        entity.attach_score().set_score(4.0);
        assert!(!entity.state().contains(EntityState::NEEDS_CREATE));
    }

    #[test]
    fn groups_are_ascending() {
        let mut entity = Entity::new();
        entity.attach_team();
        entity.attach_position();
        entity.attach_relations();
        assert_eq!(
            entity.groups(),
            vec![GroupId::Relations, GroupId::Position, GroupId::Team]
        );
    }

    #[test]
    fn creation_fields_follow_creation_order() {
        let mut entity = Entity::object();
        entity.attach_name().set_name("square");
        let order: Vec<FieldId> = entity
            .creation_fields()
            .iter()
            .map(|(field, _)| *field)
            .collect();
        assert_eq!(order, creation_field_order(&entity.groups()));
    }

    #[test]
    fn update_fields_are_dirty_only() {
        let mut entity = Entity::object();
        entity.wipe();
        if let Some(mut position) = entity.position_mut() {
            position.set_y(9.0);
        }
        if let Some(mut style) = entity.style_mut() {
            style.set_color(2);
        }
        let fields: Vec<FieldId> = entity.update_fields().iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec![FieldId::Y, FieldId::Color]);
        assert_eq!(entity.find_update(), fields);
    }

    #[test]
    fn wipe_clears_state() {
        let mut entity = Entity::object();
        entity.attach_position().set_x(1.0);
        entity.wipe();
        assert!(entity.state().is_clean());
        assert!(entity.find_update().is_empty());
    }

    #[test]
    fn deletion_animation_counts_down() {
        let mut animation = DeletionAnimation::new();
        for _ in 1..DELETION_ANIMATION_TICKS {
            assert!(!animation.advance());
        }
        assert!(animation.advance());
        assert_eq!(animation.ticks_left(), 0);
    }

    #[test]
    fn velocity_is_position_minus_reference() {
        let mut entity = Entity::object();
        entity.attach_position().set_x(4.0);
        if let Some(object) = entity.object_state_mut() {
            object.ref_x = 1.0;
        }
        assert_eq!(entity.velocity(), (3.0, 0.0));
    }
}

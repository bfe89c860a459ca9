//! Collision detection, knockback, and position integration.

use codec::{EntityRef, Tick};
use rand::Rng;
use rand_pcg::Pcg32;
use repgraph::WorldView;

use crate::entity::Entity;
use crate::flags;
use crate::manager::EntityManager;
use crate::spatial::{Aabb, SpatialIndex};

/// Fraction of velocity removed every tick.
pub const FRICTION: f32 = 0.1;
/// Speeds below this snap to zero.
pub const MIN_SPEED: f32 = 0.01;

/// Arena limits used for clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaLimits {
    pub half_width: f32,
    pub half_height: f32,
    pub padding: f32,
}

/// One entity's kinematic state for a single integration step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub x: f32,
    pub y: f32,
    pub ref_x: f32,
    pub ref_y: f32,
    pub accel_x: f32,
    pub accel_y: f32,
}

impl Motion {
    pub fn velocity(&self) -> (f32, f32) {
        (self.x - self.ref_x, self.y - self.ref_y)
    }

    /// Advances one tick.
    ///
    /// `limits` is `None` for entities that may leave the arena. A
    /// deleting entity's velocity is halved every step.
    #[must_use]
    pub fn step(mut self, limits: Option<ArenaLimits>, deleting: bool) -> Self {
        let (mut vx, mut vy) = self.velocity();
        self.accel_x -= FRICTION * vx;
        self.accel_y -= FRICTION * vy;
        vx += self.accel_x;
        vy += self.accel_y;

        if vx.hypot(vy) < MIN_SPEED {
            vx = 0.0;
            vy = 0.0;
        } else if deleting {
            vx *= 0.5;
            vy *= 0.5;
        }

        self.ref_x = self.x;
        self.ref_y = self.y;
        let (x, y) = (self.x + vx, self.y + vy);
        if x.is_finite() && y.is_finite() {
            self.x = x;
            self.y = y;
        } else {
            tracing::warn!(x, y, "non-finite position reverted");
        }
        self.accel_x = 0.0;
        self.accel_y = 0.0;

        if let Some(limits) = limits {
            let max_x = limits.half_width + limits.padding;
            let max_y = limits.half_height + limits.padding;
            if self.x.abs() > max_x {
                self.x = self.x.max(-max_x).min(max_x);
                self.ref_x = self.x;
            }
            if self.y.abs() > max_y {
                self.y = self.y.max(-max_y).min(max_y);
                self.ref_y = self.y;
            }
        }
        self
    }
}

fn is_rectangle(entity: &Entity) -> bool {
    entity.physics().is_some_and(|physics| physics.sides() == 2)
}

/// Narrow-phase test between two object entities.
fn overlaps(a: &Entity, b: &Entity) -> bool {
    let (Some(box_a), Some(box_b)) = (Aabb::of_entity(a), Aabb::of_entity(b)) else {
        return false;
    };
    match (is_rectangle(a), is_rectangle(b)) {
        (true, true) => false,
        (false, false) => {
            let dx = box_a.x - box_b.x;
            let dy = box_a.y - box_b.y;
            let reach = box_a.half_width + box_b.half_width;
            dx * dx + dy * dy <= reach * reach
        }
        (false, true) => circle_hits_rectangle(&box_a, &box_b),
        (true, false) => circle_hits_rectangle(&box_b, &box_a),
    }
}

fn nearest_point(circle: &Aabb, rect: &Aabb) -> (f32, f32) {
    (
        circle.x.max(rect.min_x()).min(rect.max_x()),
        circle.y.max(rect.min_y()).min(rect.max_y()),
    )
}

fn circle_hits_rectangle(circle: &Aabb, rect: &Aabb) -> bool {
    let (nearest_x, nearest_y) = nearest_point(circle, rect);
    let dx = circle.x - nearest_x;
    let dy = circle.y - nearest_y;
    dx * dx + dy * dy <= circle.half_width * circle.half_width
}

/// Unit vector pushing `me` away from `them`, or `None` when no contact
/// normal exists (coincident centers, or a circle center inside a
/// rectangle).
fn push_direction(me: &Entity, them: &Entity) -> Option<(f32, f32)> {
    let (mine, theirs) = (Aabb::of_entity(me)?, Aabb::of_entity(them)?);
    let (dx, dy) = match (is_rectangle(me), is_rectangle(them)) {
        (false, true) => {
            let (nx, ny) = nearest_point(&mine, &theirs);
            (mine.x - nx, mine.y - ny)
        }
        (true, false) => {
            let (nx, ny) = nearest_point(&theirs, &mine);
            (nx - theirs.x, ny - theirs.y)
        }
        _ => (mine.x - theirs.x, mine.y - theirs.y),
    };
    let distance = dx.hypot(dy);
    (distance > f32::EPSILON).then(|| (dx / distance, dy / distance))
}

fn shares_team(a: &Entity, b: &Entity) -> bool {
    let team = |e: &Entity| e.relations().map_or(EntityRef::NULL, |r| r.team());
    let flags = |e: &Entity| e.physics().map_or(0, |p| p.flags());
    let (team_a, team_b) = (team(a), team(b));
    !team_a.is_null()
        && team_a == team_b
        && (flags(a) | flags(b)) & flags::physics::NO_OWN_TEAM_COLLISION != 0
}

fn collides(
    manager: &EntityManager,
    a_ref: EntityRef,
    a: &Entity,
    b_ref: EntityRef,
    b: &Entity,
) -> bool {
    a.is_object()
        && b.is_object()
        && manager.root_of(a_ref) != manager.root_of(b_ref)
        && !shares_team(a, b)
        && overlaps(a, b)
}

/// Entities colliding with `entity` at their current positions.
fn query_collisions(
    manager: &EntityManager,
    spatial: &mut dyn SpatialIndex,
    entity: EntityRef,
) -> Vec<EntityRef> {
    let Some(me) = manager.get(entity) else {
        return Vec::new();
    };
    let Some(bounds) = Aabb::of_entity(me) else {
        return Vec::new();
    };
    spatial
        .retrieve_entities_by_entity(entity, bounds, &|r| manager.exists(r))
        .into_iter()
        .filter(|&other| {
            manager
                .get(other)
                .is_some_and(|them| collides(manager, entity, me, other, them))
        })
        .collect()
}

/// Entities colliding with `entity` this tick.
///
/// Computed on the first call in a tick and cached on the entity until the
/// tick counter changes. Physics does not fill the cache, so the first
/// query after integration sees post-integration positions.
pub fn find_collisions(
    manager: &mut EntityManager,
    spatial: &mut dyn SpatialIndex,
    entity: EntityRef,
    tick: Tick,
) -> Vec<EntityRef> {
    let cached = manager
        .get(entity)
        .and_then(Entity::object_state)
        .and_then(|object| object.collisions.as_ref())
        .filter(|(at, _)| *at == tick)
        .map(|(_, partners)| partners.clone());
    if let Some(partners) = cached {
        return partners;
    }

    let partners = query_collisions(manager, spatial, entity);
    if let Some(object) = manager.get_mut(entity).and_then(Entity::object_state_mut) {
        object.collisions = Some((tick, partners.clone()));
    }
    partners
}

/// Adds knockback from every partner to `entity`'s acceleration.
///
/// Each partner pushes with magnitude `absorption(self) * push(other)`
/// along the contact normal: center to center between circles, and from
/// the nearest rectangle point to the circle center otherwise.
fn apply_knockback(
    manager: &mut EntityManager,
    rng: &mut Pcg32,
    entity: EntityRef,
    partners: &[EntityRef],
) {
    let Some(me) = manager.get(entity) else {
        return;
    };
    let absorption = me.physics().map_or(0.0, |p| p.absorption());
    let mut accel = (0.0_f32, 0.0_f32);
    for &other in partners {
        let Some(them) = manager.get(other) else {
            continue;
        };
        let push = them.physics().map_or(0.0, |p| p.push());
        let magnitude = absorption * push;
        let (nx, ny) = push_direction(me, them).unwrap_or_else(|| {
            let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
            (angle.cos(), angle.sin())
        });
        accel.0 += nx * magnitude;
        accel.1 += ny * magnitude;
    }
    if let Some(object) = manager.get_mut(entity).and_then(Entity::object_state_mut) {
        object.accel_x += accel.0;
        object.accel_y += accel.1;
    }
}

/// Runs knockback and integration for one non-child object.
pub fn apply_physics(
    manager: &mut EntityManager,
    spatial: &mut dyn SpatialIndex,
    rng: &mut Pcg32,
    entity: EntityRef,
    limits: ArenaLimits,
) {
    let partners = query_collisions(manager, spatial, entity);
    apply_knockback(manager, rng, entity, &partners);

    let Some(me) = manager.get_mut(entity) else {
        return;
    };
    let (x, y) = me.position_xy();
    let escapes = me
        .physics()
        .is_some_and(|p| p.flags() & flags::physics::CAN_ESCAPE_ARENA != 0);
    let Some(object) = me.object_state_mut() else {
        return;
    };
    let motion = Motion {
        x,
        y,
        ref_x: object.ref_x,
        ref_y: object.ref_y,
        accel_x: object.accel_x,
        accel_y: object.accel_y,
    };
    let next = motion.step((!escapes).then_some(limits), object.deletion.is_some());
    object.ref_x = next.ref_x;
    object.ref_y = next.ref_y;
    object.accel_x = next.accel_x;
    object.accel_y = next.accel_y;
    object.collisions = None;
    if let Some(mut position) = me.position_mut() {
        position.set_x(next.x);
        position.set_y(next.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: ArenaLimits = ArenaLimits {
        half_width: 100.0,
        half_height: 100.0,
        padding: 10.0,
    };

    fn circle(x: f32, y: f32, radius: f32) -> Entity {
        let mut entity = Entity::object();
        {
            let mut position = entity.attach_position();
            position.set_x(x);
            position.set_y(y);
        }
        entity.attach_physics().set_size(radius);
        entity
    }

    fn rectangle(x: f32, y: f32, size: f32, width: f32) -> Entity {
        let mut entity = circle(x, y, size);
        {
            let mut physics = entity.attach_physics();
            physics.set_sides(2);
            physics.set_width(width);
        }
        entity
    }

    #[test]
    fn friction_slows_motion() {
        let motion = Motion {
            x: 10.0,
            ref_x: 0.0,
            ..Motion::default()
        };
        let next = motion.step(None, false);
        assert!((next.velocity().0 - 9.0).abs() < 1e-4);
        assert!((next.ref_x - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn tiny_speeds_snap_to_zero() {
        let motion = Motion {
            x: 0.005,
            ..Motion::default()
        };
        let next = motion.step(None, false);
        assert_eq!(next.velocity(), (0.0, 0.0));
    }

    #[test]
    fn deletion_halves_velocity() {
        let motion = Motion {
            accel_x: 10.0,
            ..Motion::default()
        };
        assert!((motion.step(None, true).x - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn clamping_resets_reference() {
        let motion = Motion {
            x: 105.0,
            ref_x: 95.0,
            ..Motion::default()
        };
        let next = motion.step(Some(LIMITS), false);
        assert!((next.x - 110.0).abs() < f32::EPSILON);
        assert_eq!(next.velocity(), (0.0, 0.0));

        let escaped = motion.step(None, false);
        assert!(escaped.x > 110.0);
    }

    #[test]
    fn non_finite_positions_revert() {
        let motion = Motion {
            x: 1.0,
            ref_x: 1.0,
            accel_x: f32::INFINITY,
            ..Motion::default()
        };
        let next = motion.step(None, false);
        assert!((next.x - 1.0).abs() < f32::EPSILON);
        assert!(next.x.is_finite());
    }

    #[test]
    fn circles_overlap_by_distance() {
        assert!(overlaps(&circle(0.0, 0.0, 10.0), &circle(15.0, 0.0, 10.0)));
        assert!(!overlaps(&circle(0.0, 0.0, 10.0), &circle(15.0, 15.0, 10.0)));
    }

    #[test]
    fn circle_against_rectangle_uses_nearest_point() {
        let wall = rectangle(0.0, 0.0, 100.0, 20.0);
        assert!(overlaps(&circle(0.0, 15.0, 6.0), &wall));
        assert!(overlaps(&wall, &circle(0.0, 15.0, 6.0)));
        // Inside the bounding box reach but past the corner.
        assert!(!overlaps(&circle(55.0, 15.0, 6.0), &wall));
    }

    #[test]
    fn walls_push_along_their_normal() {
        let wall = rectangle(0.0, 0.0, 1000.0, 20.0);
        let ball = circle(400.0, 15.0, 10.0);
        let (nx, ny) = push_direction(&ball, &wall).unwrap();
        assert!(nx.abs() < 1e-6 && (ny - 1.0).abs() < 1e-6, "({nx}, {ny})");
        let (nx, ny) = push_direction(&wall, &ball).unwrap();
        assert!(nx.abs() < 1e-6 && (ny + 1.0).abs() < 1e-6, "({nx}, {ny})");

        let corner = circle(505.0, 15.0, 10.0);
        let (nx, ny) = push_direction(&corner, &wall).unwrap();
        assert!(nx > 0.0 && ny > 0.0);
    }

    #[test]
    fn centers_inside_a_wall_have_no_normal() {
        let wall = rectangle(0.0, 0.0, 1000.0, 20.0);
        assert_eq!(push_direction(&circle(100.0, 5.0, 10.0), &wall), None);
        assert_eq!(
            push_direction(&circle(3.0, 4.0, 10.0), &circle(3.0, 4.0, 10.0)),
            None
        );
    }

    #[test]
    fn rectangles_never_collide() {
        let a = rectangle(0.0, 0.0, 50.0, 50.0);
        let b = rectangle(5.0, 5.0, 50.0, 50.0);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn same_team_skips_with_flag() {
        let mut manager = EntityManager::new(8);
        let team = manager.allocate(Entity::new()).unwrap();
        let mut a = circle(0.0, 0.0, 10.0);
        a.attach_relations().set_team(team);
        let mut b = circle(5.0, 0.0, 10.0);
        b.attach_relations().set_team(team);
        assert!(!shares_team(&a, &b));
        b.attach_physics()
            .set_flags(flags::physics::NO_OWN_TEAM_COLLISION);
        assert!(shares_team(&a, &b));
    }
}

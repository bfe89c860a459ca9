//! Broad-phase spatial indexing, rebuilt every tick.
//!
//! Two interchangeable strategies implement [`SpatialIndex`]: a uniform
//! grid and a quad tree. Both duplicate an entry into every bucket it
//! overlaps and de-duplicate on query with a per-query stamp.

mod grid;
mod quadtree;

pub use grid::UniformGrid;
pub use quadtree::QuadTree;

use std::fmt;

use codec::EntityRef;

use crate::config::SpatialStrategy;
use crate::entity::Entity;

/// Axis-aligned box given by its center and half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, half_width: f32, half_height: f32) -> Self {
        Self {
            x,
            y,
            half_width,
            half_height,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.x - self.half_width
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.half_width
    }

    pub fn min_y(&self) -> f32 {
        self.y - self.half_height
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.half_height
    }

    pub fn from_extents(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(
            (min_x + max_x) / 2.0,
            (min_y + max_y) / 2.0,
            (max_x - min_x) / 2.0,
            (max_y - min_y) / 2.0,
        )
    }

    /// Clamps every edge into `outer`. Overlapping boxes stay overlapping.
    pub fn clamped_to(&self, outer: &Self) -> Self {
        let clamp_x = |v: f32| v.max(outer.min_x()).min(outer.max_x());
        let clamp_y = |v: f32| v.max(outer.min_y()).min(outer.max_y());
        Self::from_extents(
            clamp_x(self.min_x()),
            clamp_y(self.min_y()),
            clamp_x(self.max_x()),
            clamp_y(self.max_y()),
        )
    }

    /// Closed-interval overlap test; touching boxes intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }

    /// Bounds of an entity with position and physics groups.
    ///
    /// Rectangles (`sides == 2`) use `size / 2` by `width / 2`; every other
    /// shape uses its radius on both axes.
    pub fn of_entity(entity: &Entity) -> Option<Self> {
        let position = entity.position()?;
        let physics = entity.physics()?;
        let (half_width, half_height) = if physics.sides() == 2 {
            (physics.size() / 2.0, physics.width() / 2.0)
        } else {
            (physics.size(), physics.size())
        };
        Some(Self::new(position.x(), position.y(), half_width, half_height))
    }
}

/// Capability shared by every broad-phase strategy.
pub trait SpatialIndex: fmt::Debug {
    /// Drops every entry and sets the half extents of the centered arena.
    fn reset(&mut self, bound_x: f32, bound_y: f32);

    fn insert_entity(&mut self, entity: EntityRef, bounds: Aabb);

    /// Entries whose bounds intersect `query`, each at most once, filtered
    /// by `is_live`. May include entries that only touch the query box.
    fn retrieve(&mut self, query: Aabb, is_live: &dyn Fn(EntityRef) -> bool) -> Vec<EntityRef>;

    /// Number of distinct entries since the last reset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// [`SpatialIndex::retrieve`] around an entity's own bounds, without
    /// the entity itself.
    fn retrieve_entities_by_entity(
        &mut self,
        entity: EntityRef,
        bounds: Aabb,
        is_live: &dyn Fn(EntityRef) -> bool,
    ) -> Vec<EntityRef> {
        let mut found = self.retrieve(bounds, is_live);
        found.retain(|other| *other != entity);
        found
    }
}

/// Builds the index selected by `strategy`.
pub fn build(strategy: &SpatialStrategy) -> Box<dyn SpatialIndex> {
    match *strategy {
        SpatialStrategy::Grid { cell_shift } => Box::new(UniformGrid::new(cell_shift)),
        SpatialStrategy::QuadTree {
            split_threshold,
            max_depth,
        } => Box::new(QuadTree::new(split_threshold, max_depth)),
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    entity: EntityRef,
    bounds: Aabb,
    stamp: u32,
}

/// Entry storage with stamp-based de-duplication.
#[derive(Debug, Default)]
struct EntryStore {
    entries: Vec<Entry>,
    token: u32,
}

impl EntryStore {
    fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, entity: EntityRef, bounds: Aabb) -> u32 {
        self.entries.push(Entry {
            entity,
            bounds,
            stamp: 0,
        });
        self.entries.len() as u32 - 1
    }

    fn get(&self, index: u32) -> Option<&Entry> {
        self.entries.get(index as usize)
    }

    fn begin_query(&mut self) -> u32 {
        self.token = self.token.wrapping_add(1);
        if self.token == 0 {
            for entry in &mut self.entries {
                entry.stamp = 0;
            }
            self.token = 1;
        }
        self.token
    }

    /// Stamps `index` with `token`; `true` on the first visit this query.
    fn visit(&mut self, index: u32, token: u32) -> bool {
        match self.entries.get_mut(index as usize) {
            Some(entry) if entry.stamp != token => {
                entry.stamp = token;
                true
            }
            _ => false,
        }
    }

    /// Visits `index` and pushes it onto `out` if it matches `query`.
    fn collect(
        &mut self,
        index: u32,
        token: u32,
        query: &Aabb,
        is_live: &dyn Fn(EntityRef) -> bool,
        out: &mut Vec<EntityRef>,
    ) {
        if !self.visit(index, token) {
            return;
        }
        if let Some(entry) = self.get(index) {
            if entry.bounds.intersects(query) && is_live(entry.entity) {
                out.push(entry.entity);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb::new(2.0, 0.0, 1.0, 1.0);
        let c = Aabb::new(2.5, 0.0, 0.25, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn clamping_keeps_overlap() {
        let outer = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let wide = Aabb::new(100.0, 0.0, 20.0, 5.0);
        let beyond = Aabb::new(115.0, 0.0, 2.0, 2.0);
        assert!(wide.intersects(&beyond));
        assert!(wide.clamped_to(&outer).intersects(&beyond.clamped_to(&outer)));
        assert_eq!(
            beyond.clamped_to(&outer),
            Aabb::new(100.0, 0.0, 0.0, 2.0)
        );
    }

    #[test]
    fn rectangle_bounds_use_half_size_and_width() {
        let mut entity = Entity::object();
        entity.attach_position().set_x(10.0);
        {
            let mut physics = entity.attach_physics();
            physics.set_sides(2);
            physics.set_size(40.0);
            physics.set_width(20.0);
        }
        assert_eq!(
            Aabb::of_entity(&entity),
            Some(Aabb::new(10.0, 0.0, 20.0, 10.0))
        );
    }

    #[test]
    fn circle_bounds_use_radius() {
        let mut entity = Entity::object();
        entity.attach_physics().set_size(12.0);
        assert_eq!(
            Aabb::of_entity(&entity),
            Some(Aabb::new(0.0, 0.0, 12.0, 12.0))
        );
        assert_eq!(Aabb::of_entity(&Entity::new()), None);
    }

    #[test]
    fn token_wrap_resets_stamps() {
        let mut store = EntryStore {
            token: u32::MAX - 1,
            ..EntryStore::default()
        };
        let index = store.push(EntityRef::new(0, 1), Aabb::new(0.0, 0.0, 1.0, 1.0));
        let first = store.begin_query();
        assert!(store.visit(index, first));
        assert!(!store.visit(index, first));
        let wrapped = store.begin_query();
        assert_eq!(wrapped, 1);
        assert!(store.visit(index, wrapped));
    }
}

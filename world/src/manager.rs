//! Slot allocation, generation hashes, and the view compiler's window
//! into the world.

use std::collections::BTreeSet;

use codec::{CreationRecord, EntityRef, FieldValue, UpdateRecord};
use repgraph::{EntityState, WorldView};
use schema::FieldId;

use crate::entity::Entity;
use crate::error::{WorldError, WorldResult};

#[derive(Debug, Default)]
struct Slot {
    /// Generation of the current or last occupant. Never 0 once used.
    generation: u32,
    /// Generation frozen at the last destroy.
    preserved_hash: u32,
    entity: Option<Entity>,
}

/// Owns every entity and hands out `(id, hash)` references.
///
/// Allocation always takes the lowest free id. Each reuse of a slot bumps
/// its generation (skipping 0), so references to a previous occupant stop
/// resolving.
#[derive(Debug)]
pub struct EntityManager {
    slots: Vec<Slot>,
    free: BTreeSet<u32>,
    capacity: u32,
    live: usize,
}

const fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

impl EntityManager {
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
            capacity,
            live: 0,
        }
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    pub const fn len(&self) -> usize {
        self.live
    }

    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Registers `entity` in the lowest free slot.
    pub fn allocate(&mut self, mut entity: Entity) -> WorldResult<EntityRef> {
        let id = match self.free.pop_first() {
            Some(id) => id,
            None if (self.slots.len() as u32) < self.capacity => {
                self.slots.push(Slot::default());
                self.slots.len() as u32 - 1
            }
            None => {
                return Err(WorldError::OutOfEntities {
                    capacity: self.capacity,
                })
            }
        };
        let slot = &mut self.slots[id as usize];
        slot.generation = next_generation(slot.generation);
        entity.set_registered();
        slot.entity = Some(entity);
        self.live += 1;
        Ok(EntityRef::new(id, slot.generation))
    }

    /// Removes the entity immediately and frees its slot. Returns `None`
    /// for stale references.
    pub fn destroy(&mut self, entity: EntityRef) -> Option<Entity> {
        if !self.exists(entity) {
            return None;
        }
        let slot = self.slots.get_mut(entity.id as usize)?;
        slot.preserved_hash = slot.generation;
        let removed = slot.entity.take();
        self.free.insert(entity.id);
        self.live -= 1;
        removed
    }

    /// Generation of the live occupant of `id`, or 0.
    pub fn hash_of(&self, id: u32) -> u32 {
        self.slots
            .get(id as usize)
            .filter(|slot| slot.entity.is_some())
            .map_or(0, |slot| slot.generation)
    }

    pub fn exists(&self, entity: EntityRef) -> bool {
        !entity.is_null() && self.hash_of(entity.id) == entity.hash
    }

    pub fn get(&self, entity: EntityRef) -> Option<&Entity> {
        if !self.exists(entity) {
            return None;
        }
        self.slots.get(entity.id as usize)?.entity.as_ref()
    }

    pub fn get_mut(&mut self, entity: EntityRef) -> Option<&mut Entity> {
        if !self.exists(entity) {
            return None;
        }
        self.slots.get_mut(entity.id as usize)?.entity.as_mut()
    }

    /// Every live reference in ascending id order.
    pub fn live_refs(&self) -> Vec<EntityRef> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entity.is_some())
            .map(|(id, slot)| EntityRef::new(id as u32, slot.generation))
            .collect()
    }

    /// Clears dirty state on every live entity.
    pub fn wipe_all(&mut self) {
        for entity in self.slots.iter_mut().filter_map(|slot| slot.entity.as_mut()) {
            entity.wipe();
        }
    }

    fn resolve_refs(&self, mut fields: Vec<(FieldId, FieldValue)>) -> Vec<(FieldId, FieldValue)> {
        for (_, value) in &mut fields {
            if let FieldValue::Entity(target) = value {
                if !self.exists(*target) {
                    *target = EntityRef::NULL;
                }
            }
        }
        fields
    }
}

impl WorldView for EntityManager {
    fn current_hash(&self, id: u32) -> u32 {
        self.hash_of(id)
    }

    fn preserved_hash(&self, id: u32) -> u32 {
        self.slots.get(id as usize).map_or(0, |slot| {
            if slot.entity.is_some() {
                slot.generation
            } else {
                slot.preserved_hash
            }
        })
    }

    fn state(&self, entity: EntityRef) -> EntityState {
        self.get(entity).map_or_else(EntityState::default, Entity::state)
    }

    fn root_of(&self, entity: EntityRef) -> EntityRef {
        let mut current = entity;
        // Bounded by capacity so a malformed parent cycle cannot hang.
        for _ in 0..=self.capacity {
            let Some(parent) = self.get(current).map(Entity::parent) else {
                break;
            };
            if !self.exists(parent) {
                break;
            }
            current = parent;
        }
        current
    }

    fn creation_record(&self, entity: EntityRef) -> CreationRecord {
        let (groups, fields) = self.get(entity).map_or_else(Default::default, |e| {
            (e.groups(), self.resolve_refs(e.creation_fields()))
        });
        CreationRecord {
            entity,
            groups,
            fields,
        }
    }

    fn update_record(&self, entity: EntityRef) -> Option<UpdateRecord> {
        let fields = self.resolve_refs(self.get(entity)?.update_fields());
        if fields.is_empty() {
            return None;
        }
        Some(UpdateRecord { entity, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> EntityManager {
        EntityManager::new(16)
    }

    #[test]
    fn allocates_lowest_free_id() {
        let mut m = manager();
        let a = m.allocate(Entity::new()).unwrap();
        let b = m.allocate(Entity::new()).unwrap();
        let c = m.allocate(Entity::new()).unwrap();
        assert_eq!((a.id, b.id, c.id), (0, 1, 2));

        m.destroy(c);
        m.destroy(a);
        assert_eq!(m.allocate(Entity::new()).unwrap().id, 0);
        assert_eq!(m.allocate(Entity::new()).unwrap().id, 2);
    }

    #[test]
    fn reuse_bumps_generation() {
        let mut m = manager();
        let first = m.allocate(Entity::new()).unwrap();
        assert_ne!(first.hash, 0);
        m.destroy(first);
        let second = m.allocate(Entity::new()).unwrap();
        assert_eq!(second.id, first.id);
        assert_ne!(second.hash, first.hash);
        assert!(!m.exists(first));
        assert!(m.get(first).is_none());
        assert!(m.exists(second));
    }

    #[test]
    fn generation_skips_zero() {
        assert_eq!(next_generation(u32::MAX), 1);
        assert_eq!(next_generation(0), 1);
        assert_eq!(next_generation(7), 8);
    }

    #[test]
    fn hash_is_zero_when_dead() {
        let mut m = manager();
        let e = m.allocate(Entity::new()).unwrap();
        assert_eq!(m.hash_of(e.id), e.hash);
        m.destroy(e);
        assert_eq!(m.hash_of(e.id), 0);
        assert_eq!(m.preserved_hash(e.id), e.hash);
        assert_eq!(m.hash_of(99), 0);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut m = EntityManager::new(2);
        m.allocate(Entity::new()).unwrap();
        m.allocate(Entity::new()).unwrap();
        assert_eq!(
            m.allocate(Entity::new()),
            Err(WorldError::OutOfEntities { capacity: 2 })
        );
    }

    #[test]
    fn destroy_twice_is_noop() {
        let mut m = manager();
        let e = m.allocate(Entity::new()).unwrap();
        assert!(m.destroy(e).is_some());
        assert!(m.destroy(e).is_none());
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn root_follows_live_parents() {
        let mut m = manager();
        let root = m.allocate(Entity::object()).unwrap();
        let mut child = Entity::object();
        child.attach_relations().set_parent(root);
        let child = m.allocate(child).unwrap();
        let mut grandchild = Entity::object();
        grandchild.attach_relations().set_parent(child);
        let grandchild = m.allocate(grandchild).unwrap();

        assert_eq!(m.root_of(grandchild), root);
        m.destroy(root);
        assert_eq!(m.root_of(grandchild), child);
    }

    #[test]
    fn records_null_out_dead_references() {
        let mut m = manager();
        let owner = m.allocate(Entity::object()).unwrap();
        let mut bullet = Entity::object();
        bullet.attach_relations().set_owner(owner);
        let bullet = m.allocate(bullet).unwrap();
        m.destroy(owner);

        let record = m.creation_record(bullet);
        let owner_field = record
            .fields
            .iter()
            .find(|(field, _)| *field == FieldId::Owner)
            .map(|(_, value)| value.clone());
        assert_eq!(owner_field, Some(FieldValue::Entity(EntityRef::NULL)));
    }

    #[test]
    fn update_record_is_none_when_clean() {
        let mut m = manager();
        let e = m.allocate(Entity::object()).unwrap();
        m.wipe_all();
        assert!(m.update_record(e).is_none());
        if let Some(mut position) = m.get_mut(e).and_then(Entity::position_mut) {
            position.set_x(2.0);
        }
        let record = m.update_record(e).unwrap();
        assert_eq!(record.fields, vec![(FieldId::X, FieldValue::Float(2.0))]);
        assert!(m.state(e).contains(EntityState::NEEDS_UPDATE));
    }

    #[test]
    fn live_refs_are_ascending() {
        let mut m = manager();
        let refs: Vec<_> = (0..4).map(|_| m.allocate(Entity::new()).unwrap()).collect();
        m.destroy(refs[1]);
        assert_eq!(m.live_refs(), vec![refs[0], refs[2], refs[3]]);
    }
}

//! View compiler: decide which entities a viewer must be told about, not how
//! their fields are laid out.
//!
//! Each viewer keeps a [`ViewState`], the entities it currently knows and the
//! hash it knows them by. Once per tick the world hands over the viewer's
//! candidate set and [`compile_view`] diffs it against the view list,
//! producing a [`codec::UpdatePacket`] with deletes, updates, and creations.
//!
//! Precedence per entity is delete, then create, then update: an entity
//! never receives an update in the tick it is created, and a recreate sends
//! the delete first so the client drops its stale copy.

use std::collections::{BTreeMap, BTreeSet};

use codec::{CreationRecord, EntityRef, Tick, UpdatePacket, UpdateRecord};

/// Per-entity change flags, reset once per tick after every viewer compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntityState(u8);

impl EntityState {
    /// At least one field changed since the last wipe.
    pub const NEEDS_UPDATE: u8 = 1 << 0;
    /// Viewers that know the entity must receive a fresh creation record.
    pub const NEEDS_CREATE: u8 = 1 << 1;
    /// Combined with [`Self::NEEDS_CREATE`], viewers delete before recreating.
    pub const NEEDS_DELETE: u8 = 1 << 2;

    /// Creates state from raw bits.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit == bit
    }

    pub fn insert(&mut self, bit: u8) {
        self.0 |= bit;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    #[must_use]
    pub const fn is_clean(self) -> bool {
        self.0 == 0
    }
}

/// The world as seen by the view compiler.
pub trait WorldView {
    /// Hash currently stored in slot `id`, or 0 if the slot is free.
    fn current_hash(&self, id: u32) -> u32;

    /// Hash frozen when the entity was last deleted or recreated.
    fn preserved_hash(&self, id: u32) -> u32;

    /// Change flags of a live entity.
    fn state(&self, entity: EntityRef) -> EntityState;

    /// Topmost ancestor, or the entity itself when it has no parent.
    fn root_of(&self, entity: EntityRef) -> EntityRef;

    /// Full creation record of a live entity.
    fn creation_record(&self, entity: EntityRef) -> CreationRecord;

    /// Changed fields of a live entity; `None` when nothing is dirty.
    fn update_record(&self, entity: EntityRef) -> Option<UpdateRecord>;
}

/// Entities a viewer currently knows, keyed by slot id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    known: BTreeMap<u32, u32>,
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the viewer knows `entity` under the same hash.
    #[must_use]
    pub fn contains(&self, entity: EntityRef) -> bool {
        self.known.get(&entity.id) == Some(&entity.hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Known entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.known
            .iter()
            .map(|(&id, &hash)| EntityRef { id, hash })
    }

    /// Forgets everything, e.g. when the viewer reconnects.
    pub fn clear(&mut self) {
        self.known.clear();
    }
}

/// Diffs `candidates` against `view` and returns this tick's packet.
///
/// `candidates` are live references gathered by the world (field of view,
/// globally visible entities, children, and the viewer's own entities).
/// The view list is updated in place.
pub fn compile_view(
    view: &mut ViewState,
    candidates: &[EntityRef],
    world: &impl WorldView,
    tick: Tick,
) -> UpdatePacket {
    let mut packet = UpdatePacket::new(tick);
    let next: BTreeSet<u32> = candidates
        .iter()
        .filter(|c| !c.is_null() && world.current_hash(c.id) == c.hash)
        .map(|c| c.id)
        .collect();

    // Deletes: dead, slot reused, left the candidate set, or orphaned.
    view.known.retain(|&id, &mut hash| {
        let entity = EntityRef { id, hash };
        let keep = world.current_hash(id) == hash
            && next.contains(&id)
            && root_in(&next, world, entity);
        if !keep {
            packet.deletes.push(entity);
        }
        keep
    });

    let mut seen = BTreeSet::new();
    for &candidate in candidates {
        if !next.contains(&candidate.id) || !seen.insert(candidate.id) {
            continue;
        }
        if !root_in(&next, world, candidate) {
            continue;
        }
        let state = world.state(candidate);
        if !view.contains(candidate) {
            packet.creations.push(world.creation_record(candidate));
            view.known.insert(candidate.id, candidate.hash);
        } else if state.contains(EntityState::NEEDS_CREATE) {
            if state.contains(EntityState::NEEDS_DELETE) {
                let preserved = world.preserved_hash(candidate.id);
                let hash = if preserved == 0 {
                    candidate.hash
                } else {
                    preserved
                };
                packet.deletes.push(EntityRef::new(candidate.id, hash));
            }
            packet.creations.push(world.creation_record(candidate));
        } else if state.contains(EntityState::NEEDS_UPDATE) {
            if let Some(record) = world.update_record(candidate) {
                if !record.fields.is_empty() {
                    packet.updates.push(record);
                }
            }
        }
    }

    tracing::trace!(
        tick = tick.raw(),
        deletes = packet.deletes.len(),
        creations = packet.creations.len(),
        updates = packet.updates.len(),
        known = view.len(),
        "compiled view"
    );
    packet
}

fn root_in(next: &BTreeSet<u32>, world: &impl WorldView, entity: EntityRef) -> bool {
    let root = world.root_of(entity);
    root == entity || (world.current_hash(root.id) == root.hash && next.contains(&root.id))
}

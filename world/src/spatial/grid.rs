use std::collections::HashMap;

use codec::EntityRef;

use super::{Aabb, EntryStore, SpatialIndex};

/// Highest cell coordinate that fits the 10-bit key halves.
const MAX_CELL: u32 = (1 << 10) - 1;

/// Uniform grid of `1 << cell_shift` sized square cells.
///
/// Cells are keyed `x | (y << 10)` after offsetting coordinates by the
/// arena half extents, so the centered arena starts at cell 0. Positions
/// outside the arena land in the edge cells.
#[derive(Debug)]
pub struct UniformGrid {
    shift: u32,
    bound_x: f32,
    bound_y: f32,
    last_x: u32,
    last_y: u32,
    cells: HashMap<u32, Vec<u32>>,
    store: EntryStore,
}

impl UniformGrid {
    pub fn new(cell_shift: u32) -> Self {
        Self {
            shift: cell_shift.min(31),
            bound_x: 0.0,
            bound_y: 0.0,
            last_x: 0,
            last_y: 0,
            cells: HashMap::new(),
            store: EntryStore::default(),
        }
    }

    const fn key(x: u32, y: u32) -> u32 {
        x | (y << 10)
    }

    fn cell(&self, value: f32, bound: f32, last: u32) -> u32 {
        let offset = (value + bound).max(0.0) as u32;
        (offset >> self.shift).min(last)
    }

    fn cell_range(&self, bounds: &Aabb) -> (u32, u32, u32, u32) {
        (
            self.cell(bounds.min_x(), self.bound_x, self.last_x),
            self.cell(bounds.min_y(), self.bound_y, self.last_y),
            self.cell(bounds.max_x(), self.bound_x, self.last_x),
            self.cell(bounds.max_y(), self.bound_y, self.last_y),
        )
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

impl SpatialIndex for UniformGrid {
    fn reset(&mut self, bound_x: f32, bound_y: f32) {
        self.bound_x = bound_x.max(0.0);
        self.bound_y = bound_y.max(0.0);
        self.last_x = (((self.bound_x * 2.0) as u32) >> self.shift).min(MAX_CELL);
        self.last_y = (((self.bound_y * 2.0) as u32) >> self.shift).min(MAX_CELL);
        self.cells.clear();
        self.store.clear();
    }

    fn insert_entity(&mut self, entity: EntityRef, bounds: Aabb) {
        let index = self.store.push(entity, bounds);
        let (x0, y0, x1, y1) = self.cell_range(&bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells.entry(Self::key(x, y)).or_default().push(index);
            }
        }
    }

    fn retrieve(&mut self, query: Aabb, is_live: &dyn Fn(EntityRef) -> bool) -> Vec<EntityRef> {
        let token = self.store.begin_query();
        let (x0, y0, x1, y1) = self.cell_range(&query);
        let mut out = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let Some(cell) = self.cells.get(&Self::key(x, y)) else {
                    continue;
                };
                for &index in cell {
                    self.store.collect(index, token, &query, is_live, &mut out);
                }
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

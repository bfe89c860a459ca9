use codec::EntityRef;

use super::{Aabb, EntryStore, SpatialIndex};

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    depth: u32,
    entries: Vec<u32>,
    children: Option<[usize; 4]>,
}

impl Node {
    const fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }
}

/// Region quad tree over the arena, stored as a flat node arena.
///
/// A leaf splits once it holds `split_threshold` entries and is shallower
/// than `max_depth`. Entries are pushed into every child they overlap.
/// Routing clamps boxes into the root, so entries past the arena edge land
/// in the border nodes and are still found by queries past the edge.
#[derive(Debug)]
pub struct QuadTree {
    split_threshold: usize,
    max_depth: u32,
    nodes: Vec<Node>,
    store: EntryStore,
}

impl QuadTree {
    pub fn new(split_threshold: usize, max_depth: u32) -> Self {
        Self {
            split_threshold: split_threshold.max(1),
            max_depth,
            nodes: vec![Node::new(Aabb::new(0.0, 0.0, 0.0, 0.0), 0)],
            store: EntryStore::default(),
        }
    }

    /// Total node count, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn root(&self) -> Aabb {
        self.nodes[0].bounds
    }

    fn insert_at(&mut self, node: usize, entry: u32) {
        let root = self.root();
        let Some(bounds) = self.store.get(entry).map(|e| e.bounds.clamped_to(&root)) else {
            return;
        };
        if let Some(children) = self.nodes[node].children {
            let mut placed = false;
            for child in children {
                if self.nodes[child].bounds.intersects(&bounds) {
                    self.insert_at(child, entry);
                    placed = true;
                }
            }
            if !placed {
                self.nodes[node].entries.push(entry);
            }
            return;
        }

        let target = &mut self.nodes[node];
        target.entries.push(entry);
        if target.entries.len() >= self.split_threshold && target.depth < self.max_depth {
            self.split(node);
        }
    }

    fn split(&mut self, node: usize) {
        let Node { bounds, depth, .. } = self.nodes[node];
        let half_width = bounds.half_width / 2.0;
        let half_height = bounds.half_height / 2.0;
        let first = self.nodes.len();
        for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            let quadrant = Aabb::new(
                bounds.x + dx * half_width,
                bounds.y + dy * half_height,
                half_width,
                half_height,
            );
            self.nodes.push(Node::new(quadrant, depth + 1));
        }
        self.nodes[node].children = Some([first, first + 1, first + 2, first + 3]);
        let entries = std::mem::take(&mut self.nodes[node].entries);
        for entry in entries {
            self.insert_at(node, entry);
        }
    }
}

impl SpatialIndex for QuadTree {
    fn reset(&mut self, bound_x: f32, bound_y: f32) {
        self.nodes.clear();
        self.nodes.push(Node::new(
            Aabb::new(0.0, 0.0, bound_x.max(0.0), bound_y.max(0.0)),
            0,
        ));
        self.store.clear();
    }

    fn insert_entity(&mut self, entity: EntityRef, bounds: Aabb) {
        let entry = self.store.push(entity, bounds);
        self.insert_at(0, entry);
    }

    fn retrieve(&mut self, query: Aabb, is_live: &dyn Fn(EntityRef) -> bool) -> Vec<EntityRef> {
        let token = self.store.begin_query();
        let routed = query.clamped_to(&self.root());
        let mut out = Vec::new();
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if index != 0 && !node.bounds.intersects(&routed) {
                continue;
            }
            if let Some(children) = node.children {
                stack.extend(children.iter().rev());
            }
            for position in 0..self.nodes[index].entries.len() {
                let entry = self.nodes[index].entries[position];
                self.store.collect(entry, token, &query, is_live, &mut out);
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

//! # Voxel A*
//!
//! A* over walkable voxels. A voxel is walkable when it and the voxel above
//! are air and the voxel below is solid.
//!
//! ## Moves
//!
//! From each node, 8 horizontal directions are tried in a fixed order:
//!
//! 1. **Flat**: the neighbor at the same height is walkable.
//! 2. **Step up**: otherwise climb up to `max_step_up` voxels, if the
//!    head clearance above the current node allows it.
//! 3. **Fall**: otherwise, if the neighbor column is open, drop up to
//!    `max_fall` voxels onto the first walkable voxel, stopping at the
//!    first solid voxel.
//!
//! A diagonal move needs both orthogonal side cells walkable. When the
//! sides are only open air (a ledge corner), the diagonal may still be
//! taken as a fall.
//!
//! ## Determinism
//!
//! The open set orders by `f`, then by insertion sequence, so equal-cost
//! ties always resolve the same way for the same grid and endpoints.
//!
//! Node storage is local to each query: a `Vec` of nodes with parent
//! indices and a coordinate -> index map. Nothing is shared between calls.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use bloxels_core::VoxelCoord;

use crate::costs::PathCosts;
use crate::error::PathNotFound;
use crate::query::VoxelQuery;

/// Horizontal move directions: 4 straight, then 4 diagonal.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

#[derive(Clone, Copy, Debug)]
struct PathNode {
    coord: VoxelCoord,
    g: u32,
    parent: Option<u32>,
    closed: bool,
}

/// Open-set entry. Stale entries (node since improved or closed) are
/// skipped on pop.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f32,
    seq: u64,
    g: u32,
    node: u32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // BinaryHeap is a max-heap: lowest f, then earliest insertion, wins
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Per-query search state.
struct Search {
    nodes: Vec<PathNode>,
    index: HashMap<VoxelCoord, u32>,
    open: BinaryHeap<OpenEntry>,
    seq: u64,
}

impl Search {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            open: BinaryHeap::new(),
            seq: 0,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn open(&mut self, coord: VoxelCoord, g: u32, h: f32, parent: Option<u32>) {
        let node = match self.index.get(&coord) {
            Some(&existing) => {
                let slot = &mut self.nodes[existing as usize];
                slot.g = g;
                slot.parent = parent;
                existing
            }
            None => {
                let node = self.nodes.len() as u32;
                self.nodes.push(PathNode {
                    coord,
                    g,
                    parent,
                    closed: false,
                });
                self.index.insert(coord, node);
                node
            }
        };

        #[allow(clippy::cast_precision_loss)]
        let f = g as f32 + h;
        self.open.push(OpenEntry {
            f,
            seq: self.seq,
            g,
            node,
        });
        self.seq += 1;
    }

    fn path_to(&self, node: u32) -> Vec<VoxelCoord> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(index) = current {
            let node = &self.nodes[index as usize];
            path.push(node.coord);
            current = node.parent;
        }
        path.reverse();
        path
    }
}

/// A* pathfinder over a voxel grid.
#[derive(Clone, Debug, Default)]
pub struct VoxelPathfinder {
    costs: PathCosts,
    voxel_size: f32,
}

impl VoxelPathfinder {
    /// Creates a pathfinder. `voxel_size` converts between world units and
    /// voxel coordinates.
    #[must_use]
    pub const fn new(costs: PathCosts, voxel_size: f32) -> Self {
        Self { costs, voxel_size }
    }

    /// The cost model.
    #[inline]
    #[must_use]
    pub const fn costs(&self) -> &PathCosts {
        &self.costs
    }

    /// World units per voxel.
    #[inline]
    #[must_use]
    pub const fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// `floor(pos / voxel_size)` per axis.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_voxel(&self, pos: [f32; 3]) -> VoxelCoord {
        let [x, y, z] = pos.map(|c| (c / self.voxel_size).floor() as i32);
        VoxelCoord::new(x, y, z)
    }

    /// Voxel coordinate scaled to world units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_world(&self, voxel: VoxelCoord) -> [f32; 3] {
        [
            voxel.x as f32 * self.voxel_size,
            voxel.y as f32 * self.voxel_size,
            voxel.z as f32 * self.voxel_size,
        ]
    }

    /// Finds a path between two world positions.
    ///
    /// # Errors
    ///
    /// `PathNotFound` when either endpoint is not walkable, the goal is
    /// unreachable, or the search budget runs out.
    pub fn find_path<Q: VoxelQuery + ?Sized>(
        &self,
        query: &Q,
        start: [f32; 3],
        end: [f32; 3],
    ) -> Result<Vec<[f32; 3]>, PathNotFound> {
        let path = self.find_voxel_path(query, self.to_voxel(start), self.to_voxel(end))?;
        Ok(path.into_iter().map(|voxel| self.to_world(voxel)).collect())
    }

    /// Finds a path between two voxels, both endpoints included.
    ///
    /// # Errors
    ///
    /// See [`find_path`](Self::find_path).
    pub fn find_voxel_path<Q: VoxelQuery + ?Sized>(
        &self,
        query: &Q,
        start: VoxelCoord,
        goal: VoxelCoord,
    ) -> Result<Vec<VoxelCoord>, PathNotFound> {
        if !query.is_walkable(start) {
            debug!(%start, "path rejected, start not walkable");
            return Err(PathNotFound::StartNotWalkable(start));
        }
        if !query.is_walkable(goal) {
            debug!(%goal, "path rejected, end not walkable");
            return Err(PathNotFound::EndNotWalkable(goal));
        }

        let mut search = Search::new();
        let mut moves = Vec::with_capacity(DIRECTIONS.len());
        let mut expanded = 0usize;

        search.open(start, 0, self.heuristic(start, goal), None);

        while let Some(entry) = search.open.pop() {
            let current = search.nodes[entry.node as usize];
            if current.closed || entry.g != current.g {
                continue;
            }

            if current.coord == goal {
                let path = search.path_to(entry.node);
                debug!(%start, %goal, expanded, waypoints = path.len(), "path found");
                return Ok(path);
            }

            search.nodes[entry.node as usize].closed = true;
            expanded += 1;
            if expanded > self.costs.max_expanded_nodes {
                debug!(%start, %goal, expanded, "path search budget exceeded");
                return Err(PathNotFound::SearchBudgetExceeded(expanded));
            }

            moves.clear();
            self.expand(query, current.coord, &mut moves);

            for &(next, cost) in &moves {
                let g = current.g.saturating_add(cost);
                if let Some(&known) = search.index.get(&next) {
                    let known = &search.nodes[known as usize];
                    if known.closed || g >= known.g {
                        continue;
                    }
                }
                search.open(next, g, self.heuristic(next, goal), Some(entry.node));
            }
        }

        debug!(%start, %goal, expanded, "no path");
        Err(PathNotFound::Unreachable)
    }

    /// Euclidean distance with each axis scaled by the cheapest cost per
    /// voxel along it, so it never overestimates at weight 1.
    #[allow(clippy::cast_precision_loss)]
    fn heuristic(&self, from: VoxelCoord, goal: VoxelCoord) -> f32 {
        let horizontal = (self.costs.straight as f32)
            .min(self.costs.diagonal as f32 * std::f32::consts::FRAC_1_SQRT_2);
        let vertical = self.costs.step_up.min(self.costs.fall_per_voxel) as f32;

        let dx = (goal.x - from.x) as f32 * horizontal;
        let dy = (goal.y - from.y) as f32 * horizontal;
        let dz = (goal.z - from.z) as f32 * vertical;
        (dx * dx + dy * dy + dz * dz).sqrt() * self.costs.heuristic_weight
    }

    /// Collects `(neighbor, move cost)` pairs for a node.
    fn expand<Q: VoxelQuery + ?Sized>(
        &self,
        query: &Q,
        from: VoxelCoord,
        out: &mut Vec<(VoxelCoord, u32)>,
    ) {
        for (dx, dy) in DIRECTIONS {
            let diagonal = dx != 0 && dy != 0;
            let base = if diagonal {
                self.costs.diagonal
            } else {
                self.costs.straight
            };
            let target = from.offset(dx, dy, 0);

            if diagonal {
                let side_x = from.offset(dx, 0, 0);
                let side_y = from.offset(0, dy, 0);
                if !(query.is_walkable(side_x) && query.is_walkable(side_y)) {
                    let open = |v: VoxelCoord| query.is_air(v) && query.is_air(v.up());
                    if open(side_x) && open(side_y) {
                        out.extend(self.fall(query, target, base));
                    }
                    continue;
                }
            }

            if query.is_walkable(target) {
                out.push((target, base));
            } else if let Some(step) = self.step_up(query, from, target, base) {
                out.push(step);
            } else if let Some(fall) = self.fall(query, target, base) {
                out.push(fall);
            }
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn step_up<Q: VoxelQuery + ?Sized>(
        &self,
        query: &Q,
        from: VoxelCoord,
        target: VoxelCoord,
        base: u32,
    ) -> Option<(VoxelCoord, u32)> {
        for height in 1..=self.costs.max_step_up {
            let rise = height as i32;
            // head clearance above the current node
            if !query.is_air(from.offset(0, 0, rise + 1)) {
                return None;
            }
            let up = target.offset(0, 0, rise);
            if query.is_walkable(up) {
                return Some((up, base + self.costs.step_up * height));
            }
        }
        None
    }

    #[allow(clippy::cast_possible_wrap)]
    fn fall<Q: VoxelQuery + ?Sized>(
        &self,
        query: &Q,
        target: VoxelCoord,
        base: u32,
    ) -> Option<(VoxelCoord, u32)> {
        if !(query.is_air(target) && query.is_air(target.up())) {
            return None;
        }
        for depth in 1..=self.costs.max_fall {
            let below = target.offset(0, 0, -(depth as i32));
            if query.is_solid(below) {
                return None;
            }
            if query.is_walkable(below) {
                return Some((below, base + self.costs.fall_per_voxel * depth));
            }
        }
        None
    }
}

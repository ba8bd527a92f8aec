//! Pathfinding failure reasons.

use thiserror::Error;

use bloxels_core::VoxelCoord;

/// Why no path was returned. Never a partial path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathNotFound {
    /// The start voxel has no footing, no headroom, or is blocked.
    #[error("start {0} is not walkable")]
    StartNotWalkable(VoxelCoord),

    /// The goal voxel has no footing, no headroom, or is blocked.
    #[error("end {0} is not walkable")]
    EndNotWalkable(VoxelCoord),

    /// Every reachable node was expanded without reaching the goal.
    #[error("no route to the goal")]
    Unreachable,

    /// The search expanded more nodes than allowed.
    #[error("search gave up after {0} expanded nodes")]
    SearchBudgetExceeded(usize),
}

//! Voxel lookups the pathfinder needs.

use bloxels_core::VoxelCoord;

/// Read access to the voxel grid by world voxel coordinate.
///
/// Unloaded space should read as air (not solid), which makes it
/// unwalkable for lack of footing.
pub trait VoxelQuery {
    /// Returns true if the voxel is air.
    fn is_air(&self, voxel: VoxelCoord) -> bool;

    /// Returns true if the voxel provides footing.
    fn is_solid(&self, voxel: VoxelCoord) -> bool;

    /// Air here and above, solid below.
    fn is_walkable(&self, voxel: VoxelCoord) -> bool {
        self.is_air(voxel) && self.is_air(voxel.up()) && self.is_solid(voxel.down())
    }
}

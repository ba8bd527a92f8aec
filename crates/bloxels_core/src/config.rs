//! Voxel dimensions, loaded from the `[voxel]` config table.

use serde::{Deserialize, Serialize};

use crate::coords::ChunkGeometry;
use crate::error::{VoxelError, VoxelResult};

/// Largest supported chunk edge.
pub const MAX_CHUNK_SIZE: usize = 64;

/// Chunk and voxel size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    /// Voxels along one chunk edge.
    pub chunk_size: usize,
    /// Edge length of one voxel in world units (100 = 1 m).
    pub voxel_size: f32,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            voxel_size: 100.0,
        }
    }
}

impl VoxelConfig {
    /// Checks the sizes.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a chunk size outside `1..=64` or a voxel size
    /// that is not a positive finite number.
    pub fn validate(&self) -> VoxelResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(VoxelError::InvalidConfig(format!(
                "chunk_size must be in 1..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if !self.voxel_size.is_finite() || self.voxel_size <= 0.0 {
            return Err(VoxelError::InvalidConfig(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        Ok(())
    }

    /// Geometry for these sizes.
    #[must_use]
    pub const fn geometry(&self) -> ChunkGeometry {
        ChunkGeometry::new(self.chunk_size, self.voxel_size)
    }
}

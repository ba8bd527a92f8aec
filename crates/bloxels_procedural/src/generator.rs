//! # Chunk Generator
//!
//! Fills one chunk's voxel buffer from a terrain function.
//!
//! Per voxel, with `height` the column's terrain height and `z` the world
//! voxel height:
//!
//! | Condition                           | Block                  |
//! |-------------------------------------|------------------------|
//! | `z > height`                        | Air                    |
//! | `z < 2`                             | Obsidian (bedrock)     |
//! | inside the biome's first matching band | the band's block    |
//! | otherwise                           | Stone                  |
//!
//! The generator is a pure function of `(coord, terrain)`. It runs on
//! worker threads and never touches the chunk store; the caller writes the
//! returned buffer back after checking the chunk is still loaded.

use std::sync::Arc;

use tracing::trace;

use bloxels_core::{
    BlockTypeId, ChunkCoord, ChunkGeometry, LivenessToken, VoxelError, VoxelRegistry, VoxelResult,
};

use crate::biome::BiomeTable;
use crate::terrain::{TerrainFn, TerrainSample};

/// World voxel layers below this height are bedrock.
pub const BEDROCK_LAYERS: i32 = 2;

/// Chunk data generator. Cheap to clone; shares the terrain and biomes.
#[derive(Clone)]
pub struct ChunkGenerator {
    geometry: ChunkGeometry,
    terrain: Arc<dyn TerrainFn>,
    biomes: Arc<BiomeTable>,
    stone: BlockTypeId,
    obsidian: BlockTypeId,
}

impl ChunkGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// `MissingBlock` if the registry has no "Stone" or "Obsidian".
    pub fn new(
        geometry: ChunkGeometry,
        terrain: Arc<dyn TerrainFn>,
        biomes: Arc<BiomeTable>,
        registry: &VoxelRegistry,
    ) -> VoxelResult<Self> {
        let required = |name: &str| {
            registry
                .try_id(name)
                .ok_or_else(|| VoxelError::MissingBlock(name.to_string()))
        };

        Ok(Self {
            geometry,
            terrain,
            biomes,
            stone: required("Stone")?,
            obsidian: required("Obsidian")?,
        })
    }

    /// The geometry this generator fills.
    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> &ChunkGeometry {
        &self.geometry
    }

    /// Classifies one voxel at world height `z`.
    #[must_use]
    pub fn classify(&self, z: i32, column: TerrainSample) -> BlockTypeId {
        // the voxel at `height` is the surface block
        if z > column.height {
            return BlockTypeId::AIR;
        }
        if z < BEDROCK_LAYERS {
            return self.obsidian;
        }
        self.biomes
            .surface_bands(column.biome)
            .iter()
            .find(|band| band.contains(z, column.height))
            .map_or(self.stone, |band| band.block)
    }

    /// Generates the voxel buffer for `coord`.
    ///
    /// Returns `None` if `liveness` is revoked before the buffer is done;
    /// the token is checked once per column.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord, liveness: &LivenessToken) -> Option<Vec<BlockTypeId>> {
        let size = self.geometry.chunk_size();
        let origin = self.geometry.chunk_origin_voxel(coord);
        let mut voxels = vec![BlockTypeId::AIR; self.geometry.volume()];

        let mut world_y = origin.y;
        for y in 0..size {
            let mut world_x = origin.x;
            for x in 0..size {
                if !liveness.is_alive() {
                    trace!(chunk = %coord, "generation abandoned, chunk unloaded");
                    return None;
                }

                let column = self.terrain.sample(world_x, world_y);
                let mut world_z = origin.z;
                for z in 0..size {
                    voxels[self.geometry.index(x, y, z)] = self.classify(world_z, column);
                    world_z += 1;
                }
                world_x += 1;
            }
            world_y += 1;
        }

        Some(voxels)
    }
}

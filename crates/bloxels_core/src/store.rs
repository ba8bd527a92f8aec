//! # Chunk Store
//!
//! Owns every loaded chunk, keyed by chunk coordinate.
//!
//! The map sits behind a `parking_lot::RwLock`: lookups (the scheduler,
//! snapshotting neighbors for meshing, pathfinding queries) take the
//! shared lock, while create/remove and voxel edits take the exclusive
//! lock. Callers never get a reference that outlives the guard; use the
//! closure accessors instead.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::chunk::{Chunk, LivenessToken};
use crate::coords::{ChunkCoord, ChunkGeometry, VoxelCoord};
use crate::error::{VoxelError, VoxelResult};
use crate::mesh::FaceDirection;
use crate::neighborhood::ChunkNeighborhood;
use crate::registry::BlockTypeId;

/// Pre-allocated map capacity.
const INITIAL_CHUNK_CAPACITY: usize = 1024;

/// Thread-safe coordinate -> chunk map.
pub struct ChunkStore {
    geometry: ChunkGeometry,
    chunks: RwLock<HashMap<ChunkCoord, Chunk>>,
}

impl ChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(geometry: ChunkGeometry) -> Self {
        Self {
            geometry,
            chunks: RwLock::new(HashMap::with_capacity(INITIAL_CHUNK_CAPACITY)),
        }
    }

    /// The chunk geometry every stored chunk shares.
    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> &ChunkGeometry {
        &self.geometry
    }

    /// Returns a copy of a chunk.
    ///
    /// This clones the voxel array. Prefer `with_chunk` for reads.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<Chunk> {
        self.chunks.read().get(&coord).cloned()
    }

    /// Runs a closure with shared access to a chunk.
    pub fn with_chunk<F, R>(&self, coord: ChunkCoord, f: F) -> Option<R>
    where
        F: FnOnce(&Chunk) -> R,
    {
        self.chunks.read().get(&coord).map(f)
    }

    /// Runs a closure with exclusive access to a chunk.
    pub fn with_chunk_mut<F, R>(&self, coord: ChunkCoord, f: F) -> Option<R>
    where
        F: FnOnce(&mut Chunk) -> R,
    {
        self.chunks.write().get_mut(&coord).map(f)
    }

    /// Returns true if a chunk is loaded at `coord`.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.read().contains_key(&coord)
    }

    /// Creates an empty chunk and returns its liveness token.
    ///
    /// # Errors
    ///
    /// Returns `ChunkAlreadyExists` if the coordinate is occupied; callers
    /// check first.
    pub fn create(&self, coord: ChunkCoord) -> VoxelResult<LivenessToken> {
        let mut chunks = self.chunks.write();
        if chunks.contains_key(&coord) {
            return Err(VoxelError::ChunkAlreadyExists(coord));
        }
        let chunk = Chunk::new(coord, &self.geometry);
        let token = chunk.liveness().clone();
        chunks.insert(coord, chunk);
        Ok(token)
    }

    /// Removes a chunk and revokes its liveness token.
    pub fn remove(&self, coord: ChunkCoord) -> Option<Chunk> {
        let chunk = self.chunks.write().remove(&coord)?;
        chunk.liveness().revoke();
        Some(chunk)
    }

    /// Fills a chunk's voxels from a generation result.
    ///
    /// # Errors
    ///
    /// `ChunkNotLoaded` if the chunk is gone, `VolumeMismatch` if the
    /// buffer has the wrong length.
    pub fn fill(&self, coord: ChunkCoord, data: &[BlockTypeId]) -> VoxelResult<()> {
        self.with_chunk_mut(coord, |chunk| chunk.fill(data))
            .unwrap_or(Err(VoxelError::ChunkNotLoaded(coord)))
    }

    /// Returns false for local coordinates outside the chunk.
    #[inline]
    #[must_use]
    pub fn is_voxel_in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        self.geometry.is_voxel_in_bounds(x, y, z)
    }

    /// Returns true if the chunk is loaded and has data.
    #[must_use]
    pub fn has_data(&self, coord: ChunkCoord) -> bool {
        self.with_chunk(coord, Chunk::has_data).unwrap_or(false)
    }

    /// Reads a voxel by world voxel coordinate.
    ///
    /// Unloaded chunks read as Air.
    #[must_use]
    pub fn voxel(&self, voxel: VoxelCoord) -> BlockTypeId {
        let (coord, [x, y, z]) = self.geometry.voxel_to_chunk(voxel);
        self.with_chunk(coord, |chunk| chunk.get(x, y, z))
            .unwrap_or(BlockTypeId::AIR)
    }

    /// Writes a voxel by world voxel coordinate and returns the previous
    /// block, or `None` if the chunk is not loaded.
    pub fn set_voxel(&self, voxel: VoxelCoord, id: BlockTypeId) -> Option<BlockTypeId> {
        let (coord, [x, y, z]) = self.geometry.voxel_to_chunk(voxel);
        self.with_chunk_mut(coord, |chunk| chunk.set(x, y, z, id))
            .flatten()
    }

    /// Snapshots a chunk and its six face neighbors for meshing.
    ///
    /// Neighbors that are missing or have no data are left out.
    #[must_use]
    pub fn neighborhood(&self, coord: ChunkCoord) -> Option<ChunkNeighborhood> {
        let chunks = self.chunks.read();
        let center = chunks.get(&coord)?.snapshot();

        let mut neighbors: [Option<Arc<[BlockTypeId]>>; 6] = Default::default();
        for face in FaceDirection::ALL {
            let [dx, dy, dz] = face.normal();
            neighbors[face.index()] = chunks
                .get(&coord.offset(dx, dy, dz))
                .filter(|chunk| chunk.has_data())
                .map(Chunk::snapshot);
        }

        Some(ChunkNeighborhood::new(
            coord,
            self.geometry.chunk_size(),
            center,
            neighbors,
        ))
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Returns true if no chunk is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Coordinates of all loaded chunks.
    #[must_use]
    pub fn coords(&self) -> Vec<ChunkCoord> {
        self.chunks.read().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ChunkStore {
        ChunkStore::new(ChunkGeometry::new(4, 100.0))
    }

    #[test]
    fn test_create_get_remove() {
        let store = store();
        let coord = ChunkCoord::new(0, 0, 0);

        let token = store.create(coord).unwrap();
        assert!(store.contains(coord));
        assert_eq!(store.get(coord).map(|c| c.coord()), Some(coord));

        assert_eq!(
            store.create(coord).unwrap_err(),
            VoxelError::ChunkAlreadyExists(coord)
        );

        let removed = store.remove(coord);
        assert!(removed.is_some());
        assert!(!store.contains(coord));
        assert!(!token.is_alive());
        assert!(store.remove(coord).is_none());
    }

    #[test]
    fn test_voxel_access_across_chunks() {
        let store = store();
        store.create(ChunkCoord::new(-1, 0, 0)).unwrap();
        store.create(ChunkCoord::new(0, 0, 0)).unwrap();

        assert_eq!(store.set_voxel(VoxelCoord::new(-1, 2, 3), BlockTypeId(4)), Some(BlockTypeId::AIR));
        assert_eq!(store.set_voxel(VoxelCoord::new(0, 2, 3), BlockTypeId(5)), Some(BlockTypeId::AIR));

        assert_eq!(store.voxel(VoxelCoord::new(-1, 2, 3)), BlockTypeId(4));
        assert_eq!(store.voxel(VoxelCoord::new(0, 2, 3)), BlockTypeId(5));
        assert_eq!(
            store.with_chunk(ChunkCoord::new(-1, 0, 0), |c| c.get(3, 2, 3)),
            Some(BlockTypeId(4))
        );
    }

    #[test]
    fn test_unloaded_reads_air_and_writes_nothing() {
        let store = store();

        assert_eq!(store.voxel(VoxelCoord::new(100, 100, 100)), BlockTypeId::AIR);
        assert_eq!(store.set_voxel(VoxelCoord::new(100, 100, 100), BlockTypeId(1)), None);
    }

    #[test]
    fn test_fill_missing_chunk() {
        let store = store();
        let coord = ChunkCoord::new(3, 3, 3);

        assert_eq!(
            store.fill(coord, &[BlockTypeId(1); 64]),
            Err(VoxelError::ChunkNotLoaded(coord))
        );
    }

    #[test]
    fn test_neighborhood_only_includes_neighbors_with_data() {
        let store = store();
        let center = ChunkCoord::new(0, 0, 0);
        store.create(center).unwrap();
        store.create(center.offset(1, 0, 0)).unwrap();
        store.create(center.offset(0, 0, 1)).unwrap();

        store.fill(center, &[BlockTypeId(1); 64]).unwrap();
        store.fill(center.offset(1, 0, 0), &[BlockTypeId(2); 64]).unwrap();

        let hood = store.neighborhood(center).unwrap();

        assert!(hood.has_neighbor(FaceDirection::PosX));
        assert!(!hood.has_neighbor(FaceDirection::PosZ));
        assert_eq!(hood.voxel(4, 0, 0), Some(BlockTypeId(2)));
        assert!(store.neighborhood(ChunkCoord::new(9, 9, 9)).is_none());
    }
}

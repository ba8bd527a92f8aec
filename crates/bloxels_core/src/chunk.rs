//! # Chunk
//!
//! A fixed-size cube of block IDs plus its readiness flags and mesh.
//!
//! ## Storage
//!
//! Voxels are a flat boxed slice indexed `z*size² + y*size + x`. The slice
//! is allocated once at `chunk_size³` and never resized; data fills copy
//! into it after a length check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::coords::{ChunkCoord, ChunkGeometry};
use crate::error::{VoxelError, VoxelResult};
use crate::mesh::ChunkMesh;
use crate::registry::BlockTypeId;

/// Shared flag that tells background work whether its chunk still exists.
///
/// Cloned into every generation and meshing job. `ChunkStore::remove`
/// clears it; completions check it before touching shared state, and a
/// job that finds it cleared finishes without producing a result.
#[derive(Clone, Debug)]
pub struct LivenessToken(Arc<AtomicBool>);

impl LivenessToken {
    /// Creates a live token.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Returns true until `revoke` is called on any clone.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the owning chunk as gone.
    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Returns true if both tokens belong to the same chunk instance.
    ///
    /// A coordinate that is unloaded and loaded again gets a fresh token,
    /// so results from the earlier instance never match.
    #[inline]
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A cube of voxels.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: usize,
    /// Flat voxel array, length `size³` for the chunk's whole lifetime.
    voxels: Box<[BlockTypeId]>,
    has_data: bool,
    has_mesh: bool,
    mesh: ChunkMesh,
    liveness: LivenessToken,
}

impl Chunk {
    /// Creates an all-Air chunk without data.
    #[must_use]
    pub fn new(coord: ChunkCoord, geometry: &ChunkGeometry) -> Self {
        Self {
            coord,
            size: geometry.chunk_size(),
            voxels: vec![BlockTypeId::AIR; geometry.volume()].into_boxed_slice(),
            has_data: false,
            has_mesh: false,
            mesh: ChunkMesh::new(),
            liveness: LivenessToken::new(),
        }
    }

    /// Chunk position.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Edge length in voxels.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The flat voxel array.
    #[inline]
    #[must_use]
    pub fn voxels(&self) -> &[BlockTypeId] {
        &self.voxels
    }

    /// Copies the voxel array for a background job.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[BlockTypeId]> {
        Arc::from(&self.voxels[..])
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        (x < self.size && y < self.size && z < self.size)
            .then(|| z * self.size * self.size + y * self.size + x)
    }

    /// Gets a voxel; out-of-range positions read as Air.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockTypeId {
        self.index(x, y, z)
            .map_or(BlockTypeId::AIR, |index| self.voxels[index])
    }

    /// Sets a voxel and returns the previous one.
    ///
    /// Returns `None` (and writes nothing) for out-of-range positions.
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: BlockTypeId) -> Option<BlockTypeId> {
        let index = self.index(x, y, z)?;
        Some(std::mem::replace(&mut self.voxels[index], id))
    }

    /// Copies generated voxel data in and marks the chunk as having data.
    ///
    /// # Errors
    ///
    /// Returns `VolumeMismatch` if `data` is not exactly `size³` long; the
    /// chunk is left unchanged.
    pub fn fill(&mut self, data: &[BlockTypeId]) -> VoxelResult<()> {
        if data.len() != self.voxels.len() {
            return Err(VoxelError::VolumeMismatch {
                expected: self.voxels.len(),
                actual: data.len(),
            });
        }
        self.voxels.copy_from_slice(data);
        self.has_data = true;
        Ok(())
    }

    /// True once voxel data has been filled in.
    #[inline]
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.has_data
    }

    /// True once a mesh has been applied.
    #[inline]
    #[must_use]
    pub const fn has_mesh(&self) -> bool {
        self.has_mesh
    }

    /// The applied mesh (empty until `has_mesh`).
    #[inline]
    #[must_use]
    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    /// Installs a mesh and returns the one it replaces.
    pub fn apply_mesh(&mut self, mesh: ChunkMesh) -> ChunkMesh {
        self.has_mesh = true;
        std::mem::replace(&mut self.mesh, mesh)
    }

    /// Removes the mesh, leaving the chunk unmeshed.
    pub fn take_mesh(&mut self) -> ChunkMesh {
        self.has_mesh = false;
        std::mem::take(&mut self.mesh)
    }

    /// The chunk's liveness token.
    #[inline]
    #[must_use]
    pub fn liveness(&self) -> &LivenessToken {
        &self.liveness
    }

    /// Number of non-Air voxels.
    #[must_use]
    pub fn non_air_count(&self) -> usize {
        self.voxels.iter().filter(|id| !id.is_air()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> ChunkGeometry {
        ChunkGeometry::new(4, 100.0)
    }

    #[test]
    fn test_new_chunk_is_air_without_data() {
        let chunk = Chunk::new(ChunkCoord::new(1, 2, 3), &geometry());

        assert_eq!(chunk.voxels().len(), 64);
        assert!(!chunk.has_data());
        assert!(!chunk.has_mesh());
        assert_eq!(chunk.non_air_count(), 0);
        assert!(chunk.liveness().is_alive());
    }

    #[test]
    fn test_get_set() {
        let mut chunk = Chunk::new(ChunkCoord::default(), &geometry());

        assert_eq!(chunk.set(1, 2, 3, BlockTypeId(7)), Some(BlockTypeId::AIR));
        assert_eq!(chunk.get(1, 2, 3), BlockTypeId(7));
        assert_eq!(chunk.voxels()[3 * 16 + 2 * 4 + 1], BlockTypeId(7));

        assert_eq!(chunk.set(4, 0, 0, BlockTypeId(7)), None);
        assert_eq!(chunk.get(4, 0, 0), BlockTypeId::AIR);
    }

    #[test]
    fn test_fill_rejects_wrong_volume() {
        let mut chunk = Chunk::new(ChunkCoord::default(), &geometry());

        let result = chunk.fill(&[BlockTypeId(1); 10]);

        assert_eq!(
            result,
            Err(VoxelError::VolumeMismatch {
                expected: 64,
                actual: 10
            })
        );
        assert!(!chunk.has_data());
        assert_eq!(chunk.voxels().len(), 64);
    }

    #[test]
    fn test_fill_marks_data() {
        let mut chunk = Chunk::new(ChunkCoord::default(), &geometry());

        chunk.fill(&[BlockTypeId(1); 64]).unwrap();

        assert!(chunk.has_data());
        assert_eq!(chunk.non_air_count(), 64);
    }

    #[test]
    fn test_liveness_token_shared_between_clones() {
        let token = LivenessToken::new();
        let job_copy = token.clone();

        assert!(job_copy.same_instance(&token));
        token.revoke();
        assert!(!job_copy.is_alive());
        assert!(!LivenessToken::new().same_instance(&token));
    }
}

//! Greedy meshing over a chunk and its face neighbors.
//!
//! Reduces triangle count by merging adjacent faces of the same block type
//! and direction into one quad.
//!
//! ## Algorithm
//!
//! 1. For each of the six face directions:
//! 2. Sweep every slice perpendicular to the face's axis
//! 3. Build a 2D mask of visible faces, keyed by block type
//! 4. Greedily merge: grow width along the row, then height over whole
//!    rows, clear the rectangle, emit one quad
//! 5. Append the quad to the `(block, face)` bucket
//!
//! A face is visible when its block is not invisible and the voxel one step
//! along the face normal is transparent or absent. That neighbor voxel may
//! live in the adjacent chunk, which is why meshing waits for neighbor data.
//!
//! ## Winding
//!
//! Quad corners are `V0, V0+R, V0+R+U, V0+U` where R runs along the
//! slice's first axis and U along its second. Every triangle winds
//! clockwise seen from outside the block; +X, -Y and +Z get the reversed
//! index order to achieve that.

use tracing::trace;

use bloxels_core::{
    BlockTypeId, ChunkMesh, ChunkNeighborhood, FaceDirection, LivenessToken, MeshSectionKey,
    VoxelRegistry,
};

/// Voxel lookups in chunk-local coordinates, crossing one step into the
/// six face neighbors.
pub trait NeighborFaceQuery {
    /// Chunk edge length in voxels.
    fn size(&self) -> usize;

    /// The voxel at local `(x, y, z)`. Coordinates one step outside the
    /// chunk resolve in the neighbor; `None` means no data there.
    fn voxel(&self, x: i32, y: i32, z: i32) -> Option<BlockTypeId>;
}

impl NeighborFaceQuery for ChunkNeighborhood {
    #[inline]
    fn size(&self) -> usize {
        ChunkNeighborhood::size(self)
    }

    #[inline]
    fn voxel(&self, x: i32, y: i32, z: i32) -> Option<BlockTypeId> {
        ChunkNeighborhood::voxel(self, x, y, z)
    }
}

/// Counters from one meshing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Visible voxel faces found by the mask pass.
    pub visible_faces: usize,
    /// Quads emitted after merging.
    pub quads: usize,
}

/// The two in-slice axes `(A, B)` for a primary axis.
const fn slice_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

/// Faces whose quads use the reversed index order.
const fn reversed_winding(face: FaceDirection) -> bool {
    matches!(
        face,
        FaceDirection::PosX | FaceDirection::NegY | FaceDirection::PosZ
    )
}

/// Greedy meshing engine.
///
/// Keeps its mask between runs; create one per worker thread.
#[derive(Debug, Default)]
pub struct GreedyMesher {
    /// Visible face block type per slice cell, row-major over `(A, B)`.
    mask: Vec<Option<BlockTypeId>>,
}

impl GreedyMesher {
    /// Creates a mesher with an empty working mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes a chunk into a new `ChunkMesh`.
    ///
    /// Returns `None` if `liveness` is revoked mid-run.
    pub fn mesh<Q: NeighborFaceQuery>(
        &mut self,
        query: &Q,
        registry: &VoxelRegistry,
        voxel_size: f32,
        liveness: &LivenessToken,
    ) -> Option<ChunkMesh> {
        let mut mesh = ChunkMesh::new();
        self.mesh_into(query, registry, voxel_size, liveness, &mut mesh)?;
        Some(mesh)
    }

    /// Meshes a chunk into `out`, which is cleared first.
    ///
    /// Positions are chunk-local in world units. Returns `None` if
    /// `liveness` is revoked mid-run; `out` is then incomplete.
    pub fn mesh_into<Q: NeighborFaceQuery>(
        &mut self,
        query: &Q,
        registry: &VoxelRegistry,
        voxel_size: f32,
        liveness: &LivenessToken,
        out: &mut ChunkMesh,
    ) -> Option<MeshStats> {
        let size = query.size();
        out.clear();
        self.mask.clear();
        self.mask.resize(size * size, None);

        let mut stats = MeshStats::default();
        for face in FaceDirection::ALL {
            for slice in 0..size {
                if !liveness.is_alive() {
                    trace!("meshing abandoned, chunk unloaded");
                    return None;
                }
                stats.visible_faces += self.build_mask(query, registry, face, slice);
                stats.quads += self.extract(face, slice, size, voxel_size, out);
            }
        }
        Some(stats)
    }

    /// Fills the mask for one slice and returns the visible cell count.
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn build_mask<Q: NeighborFaceQuery>(
        &mut self,
        query: &Q,
        registry: &VoxelRegistry,
        face: FaceDirection,
        slice: usize,
    ) -> usize {
        let size = query.size();
        let axis = face.axis();
        let (axis_a, axis_b) = slice_axes(axis);
        let [nx, ny, nz] = face.normal();

        let mut visible = 0;
        for b in 0..size {
            for a in 0..size {
                let mut pos = [0i32; 3];
                pos[axis] = slice as i32;
                pos[axis_a] = a as i32;
                pos[axis_b] = b as i32;
                let [x, y, z] = pos;

                let cell = &mut self.mask[b * size + a];
                *cell = None;

                let block = query.voxel(x, y, z).unwrap_or(BlockTypeId::AIR);
                if registry.is_invisible(block) {
                    continue;
                }

                let exposed = query
                    .voxel(x + nx, y + ny, z + nz)
                    .map_or(true, |neighbor| registry.is_transparent(neighbor));
                if exposed {
                    *cell = Some(block);
                    visible += 1;
                }
            }
        }
        visible
    }

    /// Merges the mask into quads and returns how many were emitted.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn extract(
        &mut self,
        face: FaceDirection,
        slice: usize,
        size: usize,
        voxel_size: f32,
        out: &mut ChunkMesh,
    ) -> usize {
        let axis = face.axis();
        let (axis_a, axis_b) = slice_axes(axis);
        let depth = if face.is_positive() { slice + 1 } else { slice };
        let normal = face.normal_f32();
        let reversed = reversed_winding(face);

        let mut quads = 0;
        for b in 0..size {
            let mut a = 0;
            while a < size {
                let Some(block) = self.mask[b * size + a] else {
                    a += 1;
                    continue;
                };

                let mut width = 1;
                while a + width < size && self.mask[b * size + a + width] == Some(block) {
                    width += 1;
                }

                let mut height = 1;
                'height: while b + height < size {
                    let row = (b + height) * size;
                    for cell in &self.mask[row + a..row + a + width] {
                        if *cell != Some(block) {
                            break 'height;
                        }
                    }
                    height += 1;
                }

                for row in b..b + height {
                    self.mask[row * size + a..row * size + a + width].fill(None);
                }

                let corner = |da: usize, db: usize| {
                    let mut p = [0.0f32; 3];
                    p[axis] = depth as f32 * voxel_size;
                    p[axis_a] = (a + da) as f32 * voxel_size;
                    p[axis_b] = (b + db) as f32 * voxel_size;
                    p
                };
                let corners = [
                    corner(0, 0),
                    corner(width, 0),
                    corner(width, height),
                    corner(0, height),
                ];

                out.section_mut(MeshSectionKey::new(block, face)).push_quad(
                    corners,
                    normal,
                    width as u32,
                    height as u32,
                    reversed,
                );
                quads += 1;
                a += width;
            }
        }
        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bloxels_core::ChunkCoord;

    const SIZE: usize = 4;

    fn index(x: usize, y: usize, z: usize) -> usize {
        z * SIZE * SIZE + y * SIZE + x
    }

    fn isolated(voxels: Vec<BlockTypeId>) -> ChunkNeighborhood {
        ChunkNeighborhood::isolated(ChunkCoord::new(0, 0, 0), SIZE, Arc::from(voxels))
    }

    fn run(hood: &ChunkNeighborhood) -> (ChunkMesh, MeshStats) {
        let registry = VoxelRegistry::with_defaults();
        let mut mesh = ChunkMesh::new();
        let stats = GreedyMesher::new()
            .mesh_into(hood, &registry, 1.0, &LivenessToken::new(), &mut mesh)
            .unwrap();
        (mesh, stats)
    }

    #[test]
    fn test_empty_chunk() {
        let (mesh, stats) = run(&isolated(vec![BlockTypeId::AIR; SIZE * SIZE * SIZE]));

        assert!(mesh.is_empty());
        assert_eq!(stats, MeshStats::default());
    }

    #[test]
    fn test_single_voxel() {
        let mut voxels = vec![BlockTypeId::AIR; SIZE * SIZE * SIZE];
        voxels[index(1, 2, 3)] = BlockTypeId(1);

        let (mesh, stats) = run(&isolated(voxels));

        assert_eq!(stats.quads, 6);
        assert_eq!(mesh.keys().len(), 6);

        let top = mesh
            .section(MeshSectionKey::new(BlockTypeId(1), FaceDirection::PosZ))
            .unwrap();
        assert_eq!(
            top.vertices,
            vec![[1.0, 2.0, 4.0], [2.0, 2.0, 4.0], [2.0, 3.0, 4.0], [1.0, 3.0, 4.0]]
        );
        assert_eq!(top.indices, vec![0, 2, 1, 0, 3, 2]);
        assert_eq!(top.normals, vec![[0.0, 0.0, 1.0]; 4]);
    }

    #[test]
    fn test_greedy_merging() {
        let mut voxels = vec![BlockTypeId::AIR; SIZE * SIZE * SIZE];
        // 2x2x1 slab
        for x in 0..2 {
            for y in 0..2 {
                voxels[index(x, y, 0)] = BlockTypeId(1);
            }
        }

        let (mesh, stats) = run(&isolated(voxels));

        assert_eq!(stats.visible_faces, 4 + 4 + 8);
        assert_eq!(stats.quads, 6);
        let top = mesh
            .section(MeshSectionKey::new(BlockTypeId(1), FaceDirection::PosZ))
            .unwrap();
        assert_eq!(top.uvs, vec![[0.0, 2.0], [2.0, 2.0], [2.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_types_do_not_merge() {
        let mut voxels = vec![BlockTypeId::AIR; SIZE * SIZE * SIZE];
        voxels[index(0, 0, 0)] = BlockTypeId(1);
        voxels[index(1, 0, 0)] = BlockTypeId(2);

        let (mesh, _) = run(&isolated(voxels));

        let bottom_stone = mesh
            .section(MeshSectionKey::new(BlockTypeId(1), FaceDirection::NegZ))
            .unwrap();
        let bottom_obsidian = mesh
            .section(MeshSectionKey::new(BlockTypeId(2), FaceDirection::NegZ))
            .unwrap();
        assert_eq!(bottom_stone.quad_count(), 1);
        assert_eq!(bottom_obsidian.quad_count(), 1);
    }

    #[test]
    fn test_transparent_neighbor_keeps_face() {
        let registry = VoxelRegistry::with_defaults();
        let glass = registry.id_from_name("Glass");
        let stone = registry.id_from_name("Stone");

        let mut voxels = vec![BlockTypeId::AIR; SIZE * SIZE * SIZE];
        voxels[index(0, 0, 0)] = stone;
        voxels[index(1, 0, 0)] = glass;

        let (mesh, _) = run(&isolated(voxels));

        // stone +X face shows through the glass; glass -X face is hidden
        assert!(mesh
            .section(MeshSectionKey::new(stone, FaceDirection::PosX))
            .is_some_and(|data| !data.is_empty()));
        assert!(mesh
            .section(MeshSectionKey::new(glass, FaceDirection::NegX))
            .map_or(true, |data| data.is_empty()));
    }

    #[test]
    fn test_revoked_token_aborts() {
        let registry = VoxelRegistry::with_defaults();
        let token = LivenessToken::new();
        token.revoke();

        let result = GreedyMesher::new().mesh(
            &isolated(vec![BlockTypeId(1); SIZE * SIZE * SIZE]),
            &registry,
            1.0,
            &token,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_mesher_reuse_resizes_mask() {
        let registry = VoxelRegistry::with_defaults();
        let token = LivenessToken::new();
        let mut mesher = GreedyMesher::new();

        let small = ChunkNeighborhood::isolated(
            ChunkCoord::new(0, 0, 0),
            2,
            Arc::from(vec![BlockTypeId(1); 8]),
        );
        let large = isolated(vec![BlockTypeId(1); SIZE * SIZE * SIZE]);

        assert_eq!(mesher.mesh(&small, &registry, 1.0, &token).unwrap().quad_count(), 6);
        assert_eq!(mesher.mesh(&large, &registry, 1.0, &token).unwrap().quad_count(), 6);
    }
}

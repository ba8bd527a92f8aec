//! # Chunk Neighborhood
//!
//! Read-only snapshot of a chunk plus its six face neighbors, handed to a
//! meshing job so it never needs the store lock while it runs.
//!
//! ```text
//!               +Z
//!               │   +Y
//!               │  ╱
//!     -X ───── [C] ───── +X
//!             ╱ │
//!          -Y   │
//!              -Z
//! ```

use std::sync::Arc;

use crate::coords::ChunkCoord;
use crate::mesh::FaceDirection;
use crate::registry::BlockTypeId;

/// Voxel snapshot of a chunk and its face neighbors.
#[derive(Clone, Debug)]
pub struct ChunkNeighborhood {
    coord: ChunkCoord,
    size: usize,
    center: Arc<[BlockTypeId]>,
    /// Indexed by `FaceDirection::index`. `None` when the neighbor is not
    /// loaded or has no data.
    neighbors: [Option<Arc<[BlockTypeId]>>; 6],
}

impl ChunkNeighborhood {
    /// Creates a neighborhood from snapshots.
    #[must_use]
    pub fn new(
        coord: ChunkCoord,
        size: usize,
        center: Arc<[BlockTypeId]>,
        neighbors: [Option<Arc<[BlockTypeId]>>; 6],
    ) -> Self {
        Self {
            coord,
            size,
            center,
            neighbors,
        }
    }

    /// A chunk with no neighbor data.
    #[must_use]
    pub fn isolated(coord: ChunkCoord, size: usize, center: Arc<[BlockTypeId]>) -> Self {
        Self::new(coord, size, center, Default::default())
    }

    /// Coordinate of the center chunk.
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

    /// The center chunk's voxels.
    #[inline]
    #[must_use]
    pub fn center(&self) -> &[BlockTypeId] {
        &self.center
    }

    /// Returns true if the neighbor across `face` has data.
    #[must_use]
    pub fn has_neighbor(&self, face: FaceDirection) -> bool {
        self.neighbors[face.index()].is_some()
    }

    /// Looks up a voxel in center-local coordinates.
    ///
    /// Coordinates one step outside the center chunk on exactly one axis
    /// are resolved in the matching neighbor. Anything else outside the
    /// center, or a missing neighbor, returns `None`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn voxel(&self, x: i32, y: i32, z: i32) -> Option<BlockTypeId> {
        const POSITIVE: [FaceDirection; 3] =
            [FaceDirection::PosX, FaceDirection::PosY, FaceDirection::PosZ];
        const NEGATIVE: [FaceDirection; 3] =
            [FaceDirection::NegX, FaceDirection::NegY, FaceDirection::NegZ];

        let edge = self.size as i32;
        let mut local = [x, y, z];
        let mut crossed = None;

        for axis in 0..3 {
            let value = local[axis];
            let face = if value < 0 {
                local[axis] = value + edge;
                Some(NEGATIVE[axis])
            } else if value >= edge {
                local[axis] = value - edge;
                Some(POSITIVE[axis])
            } else {
                None
            };

            if let Some(face) = face {
                if crossed.is_some() {
                    return None;
                }
                crossed = Some(face);
            }
        }

        if local.iter().any(|&c| c < 0 || c >= edge) {
            return None;
        }

        let [lx, ly, lz] = local.map(|c| c as usize);
        let index = lz * self.size * self.size + ly * self.size + lx;

        match crossed {
            None => self.center.get(index).copied(),
            Some(face) => self.neighbors[face.index()]
                .as_ref()
                .and_then(|voxels| voxels.get(index).copied()),
        }
    }
}

//! # Coordinates
//!
//! Three coordinate spaces are in use:
//!
//! ```text
//!   world position (f32, engine units)
//!        │  floor(pos / voxel_size)
//!        ▼
//!   voxel coordinate (i32, one per block)
//!        │  div_euclid / rem_euclid by chunk_size
//!        ▼
//!   chunk coordinate (i32) + local index (0..chunk_size)
//! ```
//!
//! `ChunkGeometry` carries the two sizes and performs every conversion, so
//! no other module divides by the chunk size by hand.

use std::fmt;

/// Chunk coordinate (in chunks, not voxels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate (vertical).
    pub z: i32,
}

impl ChunkCoord {
    /// Offsets of the six face-adjacent chunks, in `FaceDirection::ALL` order.
    pub const FACE_OFFSETS: [(i32, i32, i32); 6] = [
        (1, 0, 0),
        (-1, 0, 0),
        (0, 1, 0),
        (0, -1, 0),
        (0, 0, 1),
        (0, 0, -1),
    ];

    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this coordinate shifted by an offset.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent chunk coordinates.
    #[must_use]
    pub fn face_neighbors(self) -> [Self; 6] {
        Self::FACE_OFFSETS.map(|(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// Largest horizontal (x/y) axis distance to another chunk.
    #[inline]
    #[must_use]
    pub fn horizontal_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

/// Voxel coordinate in world space (one unit per block).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelCoord {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate (vertical).
    pub z: i32,
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this coordinate shifted by an offset.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The voxel directly above.
    #[inline]
    #[must_use]
    pub const fn up(self) -> Self {
        self.offset(0, 0, 1)
    }

    /// The voxel directly below.
    #[inline]
    #[must_use]
    pub const fn down(self) -> Self {
        self.offset(0, 0, -1)
    }

    /// Euclidean distance in voxels.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Chunk and voxel dimensions plus every conversion between spaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkGeometry {
    chunk_size: usize,
    voxel_size: f32,
}

impl ChunkGeometry {
    /// Creates a geometry. Callers validate the sizes (see `VoxelConfig`).
    #[must_use]
    pub const fn new(chunk_size: usize, voxel_size: f32) -> Self {
        Self {
            chunk_size,
            voxel_size,
        }
    }

    /// Voxels along one chunk edge.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Edge length of one voxel in world units.
    #[inline]
    #[must_use]
    pub const fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Voxels per chunk (`chunk_size³`).
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.chunk_size * self.chunk_size * self.chunk_size
    }

    /// Chunk edge length in world units.
    #[inline]
    #[must_use]
    pub fn chunk_extent(&self) -> f32 {
        self.chunk_size as f32 * self.voxel_size
    }

    #[inline]
    fn edge(&self) -> i32 {
        i32::try_from(self.chunk_size).unwrap_or(i32::MAX)
    }

    /// Flat index of a local voxel: `z*size² + y*size + x`.
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.chunk_size * self.chunk_size + y * self.chunk_size + x
    }

    /// Inverse of `index`.
    #[inline]
    #[must_use]
    pub const fn local_from_index(&self, index: usize) -> (usize, usize, usize) {
        let s = self.chunk_size;
        (index % s, (index / s) % s, index / (s * s))
    }

    /// Returns false for local coordinates outside `0..chunk_size`.
    ///
    /// Callers use this to decide whether a lookup must be forwarded to a
    /// neighboring chunk.
    #[inline]
    #[must_use]
    pub fn is_voxel_in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        let edge = self.edge();
        (0..edge).contains(&x) && (0..edge).contains(&y) && (0..edge).contains(&z)
    }

    /// `floor(pos / (chunk_size * voxel_size))` per axis.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_chunk(&self, pos: [f32; 3]) -> ChunkCoord {
        let extent = self.chunk_extent();
        ChunkCoord::new(
            (pos[0] / extent).floor() as i32,
            (pos[1] / extent).floor() as i32,
            (pos[2] / extent).floor() as i32,
        )
    }

    /// World position of a chunk's origin corner.
    #[must_use]
    pub fn chunk_to_world(&self, coord: ChunkCoord) -> [f32; 3] {
        let extent = self.chunk_extent();
        [
            coord.x as f32 * extent,
            coord.y as f32 * extent,
            coord.z as f32 * extent,
        ]
    }

    /// `floor(pos / voxel_size)` per axis.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_voxel(&self, pos: [f32; 3]) -> VoxelCoord {
        VoxelCoord::new(
            (pos[0] / self.voxel_size).floor() as i32,
            (pos[1] / self.voxel_size).floor() as i32,
            (pos[2] / self.voxel_size).floor() as i32,
        )
    }

    /// World position of a voxel's origin corner.
    #[must_use]
    pub fn voxel_to_world(&self, voxel: VoxelCoord) -> [f32; 3] {
        [
            voxel.x as f32 * self.voxel_size,
            voxel.y as f32 * self.voxel_size,
            voxel.z as f32 * self.voxel_size,
        ]
    }

    /// Splits a voxel coordinate into its chunk and local position.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn voxel_to_chunk(&self, voxel: VoxelCoord) -> (ChunkCoord, [usize; 3]) {
        let edge = self.edge();
        let chunk = ChunkCoord::new(
            voxel.x.div_euclid(edge),
            voxel.y.div_euclid(edge),
            voxel.z.div_euclid(edge),
        );
        // rem_euclid is never negative
        let local = [
            voxel.x.rem_euclid(edge) as usize,
            voxel.y.rem_euclid(edge) as usize,
            voxel.z.rem_euclid(edge) as usize,
        ];
        (chunk, local)
    }

    /// Voxel coordinate of a local position inside a chunk.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn chunk_local_to_voxel(&self, chunk: ChunkCoord, local: [usize; 3]) -> VoxelCoord {
        let edge = self.edge();
        VoxelCoord::new(
            chunk.x * edge + local[0] as i32,
            chunk.y * edge + local[1] as i32,
            chunk.z * edge + local[2] as i32,
        )
    }

    /// Voxel coordinate of a chunk's origin corner.
    #[must_use]
    pub fn chunk_origin_voxel(&self, chunk: ChunkCoord) -> VoxelCoord {
        self.chunk_local_to_voxel(chunk, [0, 0, 0])
    }
}

impl Default for ChunkGeometry {
    fn default() -> Self {
        Self::new(16, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_index_layout() {
        let geometry = ChunkGeometry::new(16, 100.0);

        assert_eq!(geometry.index(0, 0, 0), 0);
        assert_eq!(geometry.index(1, 0, 0), 1);
        assert_eq!(geometry.index(0, 1, 0), 16);
        assert_eq!(geometry.index(0, 0, 1), 256);
        assert_eq!(geometry.index(15, 15, 15), geometry.volume() - 1);
        assert_eq!(geometry.local_from_index(geometry.index(3, 7, 11)), (3, 7, 11));
    }

    #[test]
    fn test_world_chunk_round_trip() {
        let geometry = ChunkGeometry::new(16, 100.0);

        for x in -4..=4 {
            for y in -4..=4 {
                for z in -2..=2 {
                    let coord = ChunkCoord::new(x, y, z);
                    let world = geometry.chunk_to_world(coord);
                    assert_eq!(geometry.world_to_chunk(world), coord);
                }
            }
        }
    }

    #[test]
    fn test_world_to_chunk_floors_negative_positions() {
        let geometry = ChunkGeometry::new(16, 100.0);

        assert_eq!(geometry.world_to_chunk([-1.0, 0.0, 0.0]), ChunkCoord::new(-1, 0, 0));
        assert_eq!(geometry.world_to_chunk([1599.0, 1600.0, 0.0]), ChunkCoord::new(0, 1, 0));
    }

    #[test]
    fn test_voxel_to_chunk_negative() {
        let geometry = ChunkGeometry::new(16, 100.0);

        let (chunk, local) = geometry.voxel_to_chunk(VoxelCoord::new(-1, 16, -17));
        assert_eq!(chunk, ChunkCoord::new(-1, 1, -2));
        assert_eq!(local, [15, 0, 15]);

        let back = geometry.chunk_local_to_voxel(chunk, local);
        assert_eq!(back, VoxelCoord::new(-1, 16, -17));
    }

    #[test]
    fn test_bounds() {
        let geometry = ChunkGeometry::new(16, 100.0);

        assert!(geometry.is_voxel_in_bounds(0, 0, 0));
        assert!(geometry.is_voxel_in_bounds(15, 15, 15));
        assert!(!geometry.is_voxel_in_bounds(16, 0, 0));
        assert!(!geometry.is_voxel_in_bounds(0, -1, 0));
        assert!(!geometry.is_voxel_in_bounds(0, 0, 16));
    }

    #[test]
    fn test_face_neighbors() {
        let neighbors = ChunkCoord::new(0, 0, 0).face_neighbors();

        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.contains(&ChunkCoord::new(0, 0, -1)));
        assert!(neighbors.iter().all(|n| n.horizontal_distance(ChunkCoord::default()) <= 1));
    }
}

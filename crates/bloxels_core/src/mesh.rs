//! # Mesh Data Model
//!
//! The mesher groups quads into buckets keyed by `(block type, face)` so
//! the renderer can bind one material per bucket. Faces are a closed enum
//! of the six axis-aligned directions; normals are never compared as
//! floats.

use std::collections::HashMap;

use crate::registry::BlockTypeId;

/// One of the six axis-aligned outward face directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FaceDirection {
    /// +X (right).
    PosX = 0,
    /// -X (left).
    NegX = 1,
    /// +Y (front).
    PosY = 2,
    /// -Y (back).
    NegY = 3,
    /// +Z (top).
    PosZ = 4,
    /// -Z (bottom).
    NegZ = 5,
}

/// Coarse orientation used for material and tile selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceOrientation {
    /// Faces pointing up.
    Top,
    /// Faces pointing down.
    Bottom,
    /// The four horizontal faces.
    Side,
}

impl FaceDirection {
    /// All six directions, in chunk-neighbor order.
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Axis index (0 = X, 1 = Y, 2 = Z).
    #[inline]
    #[must_use]
    pub const fn axis(self) -> usize {
        match self {
            Self::PosX | Self::NegX => 0,
            Self::PosY | Self::NegY => 1,
            Self::PosZ | Self::NegZ => 2,
        }
    }

    /// Returns true for +X, +Y and +Z.
    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::PosX | Self::PosY | Self::PosZ)
    }

    /// Integer unit normal.
    #[inline]
    #[must_use]
    pub const fn normal(self) -> [i32; 3] {
        match self {
            Self::PosX => [1, 0, 0],
            Self::NegX => [-1, 0, 0],
            Self::PosY => [0, 1, 0],
            Self::NegY => [0, -1, 0],
            Self::PosZ => [0, 0, 1],
            Self::NegZ => [0, 0, -1],
        }
    }

    /// Unit normal as floats, for vertex attributes.
    #[inline]
    #[must_use]
    pub fn normal_f32(self) -> [f32; 3] {
        self.normal().map(|c| c as f32)
    }

    /// The opposite direction.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// Top, bottom or side.
    #[inline]
    #[must_use]
    pub const fn orientation(self) -> FaceOrientation {
        match self {
            Self::PosZ => FaceOrientation::Top,
            Self::NegZ => FaceOrientation::Bottom,
            _ => FaceOrientation::Side,
        }
    }

    /// Position in `ALL`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bucket key: one material binding per block type and face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshSectionKey {
    /// Block type of every quad in the bucket.
    pub block: BlockTypeId,
    /// Face direction of every quad in the bucket.
    pub face: FaceDirection,
}

impl MeshSectionKey {
    /// Creates a new key.
    #[inline]
    #[must_use]
    pub const fn new(block: BlockTypeId, face: FaceDirection) -> Self {
        Self { block, face }
    }
}

/// Renderable geometry for one bucket.
///
/// Every quad contributes 4 vertices, 4 normals, 4 UVs and 6 indices.
/// UVs are in voxel units (`(0,H) (W,H) (W,0) (0,0)`) so a tiled texture
/// repeats once per merged voxel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions, chunk-local, in world units.
    pub vertices: Vec<[f32; 3]>,
    /// Triangle list.
    pub indices: Vec<u32>,
    /// Per-vertex normals.
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex texture coordinates.
    pub uvs: Vec<[f32; 2]>,
}

impl MeshData {
    /// Appends one quad.
    ///
    /// `corners` are `V0, V0+R, V0+R+U, V0+U`. With `reversed` the two
    /// triangles are emitted as `(0,2,1) (0,3,2)` instead of
    /// `(0,1,2) (0,2,3)`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_quad(
        &mut self,
        corners: [[f32; 3]; 4],
        normal: [f32; 3],
        width: u32,
        height: u32,
        reversed: bool,
    ) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);

        if reversed {
            self.indices
                .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        } else {
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        self.normals.extend_from_slice(&[normal; 4]);

        let (w, h) = (width as f32, height as f32);
        self.uvs
            .extend_from_slice(&[[0.0, h], [w, h], [w, 0.0], [0.0, 0.0]]);
    }

    /// Number of quads.
    #[inline]
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Returns true if no quads were emitted.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Sum of `width * height` over all quads, in voxel faces.
    ///
    /// Read back from the UVs, which carry the merged dimensions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn covered_faces(&self) -> usize {
        self.uvs
            .chunks_exact(4)
            .map(|quad| (quad[1][0] as usize) * (quad[0][1] as usize))
            .sum()
    }

    /// Vertex positions as raw bytes for GPU upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Indices as raw bytes for GPU upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Empties every buffer, keeping capacity.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.normals.clear();
        self.uvs.clear();
    }
}

/// All mesh buckets of one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    sections: HashMap<MeshSectionKey, MeshData>,
}

impl ChunkMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bucket for a key, creating it if missing.
    pub fn section_mut(&mut self, key: MeshSectionKey) -> &mut MeshData {
        self.sections.entry(key).or_default()
    }

    /// Returns the bucket for a key.
    #[must_use]
    pub fn section(&self, key: MeshSectionKey) -> Option<&MeshData> {
        self.sections.get(&key)
    }

    /// Iterates non-empty buckets.
    pub fn sections(&self) -> impl Iterator<Item = (&MeshSectionKey, &MeshData)> {
        self.sections.iter().filter(|(_, data)| !data.is_empty())
    }

    /// Keys of non-empty buckets, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<MeshSectionKey> {
        let mut keys: Vec<_> = self.sections().map(|(key, _)| *key).collect();
        keys.sort_unstable();
        keys
    }

    /// Total quads across all buckets.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.sections.values().map(MeshData::quad_count).sum()
    }

    /// Total voxel faces covered across all buckets.
    #[must_use]
    pub fn covered_faces(&self) -> usize {
        self.sections.values().map(MeshData::covered_faces).sum()
    }

    /// Returns true if no bucket holds geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(MeshData::is_empty)
    }

    /// Empties every bucket, keeping the allocations for reuse.
    pub fn clear(&mut self) {
        for data in self.sections.values_mut() {
            data.clear();
        }
    }
}

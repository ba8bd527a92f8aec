//! # Bloxels Core
//!
//! The voxel data model shared by every other Bloxels crate:
//! - `VoxelRegistry`: block names, IDs and render properties
//! - `Chunk`: a fixed-size cube of block IDs plus readiness flags
//! - `ChunkStore`: the coordinate -> chunk map behind a reader/writer lock
//! - `ChunkMesh`: per (block type, face) mesh buckets produced by the mesher
//!
//! ## Architecture Rules
//!
//! 1. **Fixed volume** - a chunk's voxel array never changes length
//! 2. **Always a usable answer** - lookups of unknown names, IDs or chunks
//!    resolve to Air instead of failing
//! 3. **Liveness over cancellation** - background work carries a
//!    `LivenessToken` and its result is dropped once the chunk is gone
//!
//! ## Example
//!
//! ```rust,ignore
//! use bloxels_core::{ChunkCoord, ChunkStore, VoxelConfig};
//!
//! let store = ChunkStore::new(VoxelConfig::default().geometry());
//! let token = store.create(ChunkCoord::new(0, 0, 0))?;
//! assert!(token.is_alive());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod coords;
pub mod error;
pub mod mesh;
pub mod neighborhood;
pub mod pool;
pub mod registry;
pub mod store;

pub use chunk::{Chunk, LivenessToken};
pub use config::VoxelConfig;
pub use coords::{ChunkCoord, ChunkGeometry, VoxelCoord};
pub use error::{VoxelError, VoxelResult};
pub use mesh::{ChunkMesh, FaceDirection, FaceOrientation, MeshData, MeshSectionKey};
pub use neighborhood::ChunkNeighborhood;
pub use pool::{MeshPool, PoolStats};
pub use registry::{BlockTypeId, TileOffsets, VoxelDefinition, VoxelRegistry};
pub use store::ChunkStore;

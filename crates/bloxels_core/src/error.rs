//! # Voxel Error Types
//!
//! Errors raised while building or mutating the voxel data model.
//!
//! Lookups never produce these: an unknown name, ID or chunk resolves to
//! Air. Only structural operations (registration, chunk creation, data
//! fills, configuration) can fail.

use thiserror::Error;

use crate::coords::ChunkCoord;

/// Errors that can occur in the voxel data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoxelError {
    /// A block with this name is already registered.
    #[error("block type already registered: {0}")]
    DuplicateBlock(String),

    /// The registry ran out of 16-bit IDs.
    #[error("voxel registry is full ({0} block types)")]
    RegistryFull(usize),

    /// A block the caller depends on is not registered.
    #[error("required block type not registered: {0}")]
    MissingBlock(String),

    /// `ChunkStore::create` was called for a coordinate that is occupied.
    #[error("chunk already exists at {0}")]
    ChunkAlreadyExists(ChunkCoord),

    /// The chunk is not loaded.
    #[error("chunk not loaded at {0}")]
    ChunkNotLoaded(ChunkCoord),

    /// A voxel buffer does not match the chunk volume.
    #[error("voxel buffer holds {actual} voxels, chunk volume is {expected}")]
    VolumeMismatch {
        /// Chunk volume (`chunk_size³`).
        expected: usize,
        /// Length of the rejected buffer.
        actual: usize,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for voxel data model operations.
pub type VoxelResult<T> = Result<T, VoxelError>;

//! # World Error Types
//!
//! Errors from building and running a world. Lookup misses are not here:
//! they resolve to Air and are logged.

use std::path::PathBuf;

use thiserror::Error;

use bloxels_core::VoxelError;

use crate::structure::StructureError;

/// Errors that can occur while building or running a world.
#[derive(Error, Debug)]
pub enum WorldError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `WorldConfig`.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Registry, biome or size validation failed.
    #[error(transparent)]
    Voxel(#[from] VoxelError),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(std::io::Error),

    /// A structure document could not be parsed.
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

//! # World Configuration
//!
//! One TOML document describes a world. Every table is optional; missing
//! keys take the defaults below.
//!
//! ```toml
//! seed = 12345
//!
//! [voxel]
//! chunk_size = 16
//! voxel_size = 100.0
//!
//! [streaming]
//! load_radius = 3
//! mesh_radius = 2
//!
//! [pathfinding]
//! max_fall = 3
//!
//! [terrain]
//! mode = "flat"
//! biome = "Plains"
//! height = 12
//!
//! [[blocks]]
//! name = "Air"
//! is_transparent = true
//! is_invisible = true
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use bloxels_core::{VoxelConfig, VoxelDefinition, VoxelError, VoxelRegistry, VoxelResult};
use bloxels_pathfinding::PathCosts;
use bloxels_procedural::{
    Biome, BiomeDefinition, BiomeTable, FlatTerrain, NoiseTerrain, NoiseTerrainConfig, TerrainFn,
    WorldSeed,
};

use crate::error::{WorldError, WorldResult};

/// Streaming radii and per-tick work caps (`[streaming]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius, in chunks, of the loaded square around the observer.
    pub load_radius: i32,
    /// Chebyshev radius within which loaded chunks are meshed.
    pub mesh_radius: i32,
    /// Lowest loaded chunk layer.
    pub min_chunk_z: i32,
    /// Highest loaded chunk layer.
    pub max_chunk_z: i32,
    /// Chunk generations started per tick.
    pub creation_per_tick: usize,
    /// Mesh jobs started per tick.
    pub mesh_per_tick: usize,
    /// Meshes applied per tick.
    pub display_per_tick: usize,
    /// Worker results drained per tick.
    pub results_per_tick: usize,
    /// Worker pool threads.
    pub worker_threads: usize,
    /// Idle mesh buffers kept for reuse.
    pub mesh_pool_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: 3,
            mesh_radius: 2,
            min_chunk_z: 0,
            max_chunk_z: 3,
            creation_per_tick: 10,
            mesh_per_tick: 10,
            display_per_tick: 10,
            results_per_tick: 64,
            worker_threads: 4,
            mesh_pool_capacity: 256,
        }
    }
}

impl StreamingConfig {
    /// Checks radii, layers and caps.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for negative radii, an inverted layer range or a
    /// zero cap.
    pub fn validate(&self) -> VoxelResult<()> {
        if self.load_radius < 0 || self.mesh_radius < 0 {
            return Err(VoxelError::InvalidConfig(format!(
                "radii must be non-negative, got load {} mesh {}",
                self.load_radius, self.mesh_radius
            )));
        }
        if self.min_chunk_z > self.max_chunk_z {
            return Err(VoxelError::InvalidConfig(format!(
                "min_chunk_z {} is above max_chunk_z {}",
                self.min_chunk_z, self.max_chunk_z
            )));
        }
        let caps = [
            ("creation_per_tick", self.creation_per_tick),
            ("mesh_per_tick", self.mesh_per_tick),
            ("display_per_tick", self.display_per_tick),
            ("results_per_tick", self.results_per_tick),
            ("worker_threads", self.worker_threads),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, value)| *value == 0) {
            return Err(VoxelError::InvalidConfig(format!("{name} must be at least 1")));
        }
        if self.mesh_radius >= self.load_radius {
            warn!(
                mesh_radius = self.mesh_radius,
                load_radius = self.load_radius,
                "chunks on the load edge never get all neighbors and will not mesh"
            );
        }
        Ok(())
    }

    /// Returns true if a chunk layer is inside the loaded range.
    #[inline]
    #[must_use]
    pub const fn layer_in_range(&self, z: i32) -> bool {
        z >= self.min_chunk_z && z <= self.max_chunk_z
    }
}

/// Terrain source (`[terrain]`), selected by `mode`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TerrainConfig {
    /// Same biome and height everywhere.
    Flat {
        /// Biome of every column.
        biome: Biome,
        /// Surface height of every column.
        height: i32,
    },
    /// Noise heights and noise-classified biomes.
    Noise(NoiseTerrainConfig),
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self::Noise(NoiseTerrainConfig::default())
    }
}

impl TerrainConfig {
    /// Builds the terrain function.
    #[must_use]
    pub fn build(&self, seed: WorldSeed, biomes: Arc<BiomeTable>) -> Arc<dyn TerrainFn> {
        match self {
            Self::Flat { biome, height } => Arc::new(FlatTerrain::new(*biome, *height)),
            Self::Noise(config) => Arc::new(NoiseTerrain::new(config, seed, biomes)),
        }
    }
}

/// A whole world description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Chunk and voxel sizes.
    pub voxel: VoxelConfig,
    /// Streaming radii and caps.
    pub streaming: StreamingConfig,
    /// Path costs and limits.
    pub pathfinding: PathCosts,
    /// Terrain source.
    pub terrain: TerrainConfig,
    /// Block definitions, in ID order. The first entry should be Air.
    pub blocks: Vec<VoxelDefinition>,
    /// Biome definitions, matched in order.
    pub biomes: Vec<BiomeDefinition>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            voxel: VoxelConfig::default(),
            streaming: StreamingConfig::default(),
            pathfinding: PathCosts::default(),
            terrain: TerrainConfig::default(),
            blocks: VoxelRegistry::default_definitions(),
            biomes: BiomeDefinition::defaults(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `ConfigParse` for bad TOML, `Voxel` for invalid values.
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `ConfigRead` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> WorldResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| WorldError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for bad sizes, radii or caps, or an empty block list.
    pub fn validate(&self) -> VoxelResult<()> {
        self.voxel.validate()?;
        self.streaming.validate()?;
        if self.blocks.is_empty() {
            return Err(VoxelError::InvalidConfig("no blocks defined".to_string()));
        }
        if self.blocks[0].name != "Air" {
            warn!(first = %self.blocks[0].name, "first block is not Air; ID 0 will not read as empty");
        }
        Ok(())
    }

    /// The world seed.
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }

    /// Builds the block registry.
    ///
    /// # Errors
    ///
    /// `DuplicateBlock` or `RegistryFull`.
    pub fn build_registry(&self) -> VoxelResult<VoxelRegistry> {
        VoxelRegistry::from_definitions(self.blocks.iter().cloned())
    }

    /// Resolves the biome table against a registry.
    ///
    /// # Errors
    ///
    /// `MissingBlock` if a surface band names an unknown block.
    pub fn build_biomes(&self, registry: &VoxelRegistry) -> VoxelResult<BiomeTable> {
        BiomeTable::resolve(&self.biomes, registry)
    }
}

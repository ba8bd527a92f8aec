//! # Bloxels Procedural Generation
//!
//! Deterministic chunk data generation.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and terrain function, same voxels
//! 2. **Pluggable**: the generator only sees `TerrainFn`
//! 3. **Abandonable**: a generation whose chunk was unloaded stops early
//!    and returns nothing
//!
//! ## Core Components
//!
//! - `SimplexNoise` / `NoiseLayer`: seeded 2D noise
//! - `BiomeTable`: noise-range classification and surface bands
//! - `NoiseTerrain` / `FlatTerrain`: `TerrainFn` implementations
//! - `ChunkGenerator`: fills a chunk's voxel buffer
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bloxels_core::{ChunkCoord, LivenessToken, VoxelConfig, VoxelRegistry};
//! use bloxels_procedural::{Biome, BiomeDefinition, BiomeTable, ChunkGenerator, FlatTerrain};
//!
//! let registry = VoxelRegistry::with_defaults();
//! let biomes = BiomeTable::resolve(&BiomeDefinition::defaults(), &registry)?;
//! let generator = ChunkGenerator::new(
//!     VoxelConfig::default().geometry(),
//!     Arc::new(FlatTerrain::new(Biome::Plains, 10)),
//!     Arc::new(biomes),
//!     &registry,
//! )?;
//!
//! let voxels = generator.generate(ChunkCoord::new(0, 0, 0), &LivenessToken::new());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod generator;
pub mod noise;
pub mod terrain;

pub use biome::{Biome, BiomeDefinition, BiomeNoiseRange, BiomeTable, SurfaceBand, SurfaceBandDef};
pub use generator::{ChunkGenerator, BEDROCK_LAYERS};
pub use noise::{NoiseLayer, NoiseLayerConfig, SimplexNoise, WorldSeed};
pub use terrain::{FlatTerrain, NoiseTerrain, NoiseTerrainConfig, TerrainFn, TerrainSample};

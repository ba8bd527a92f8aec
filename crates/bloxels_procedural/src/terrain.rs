//! # Terrain Functions
//!
//! `TerrainFn` maps a world voxel column `(x, y)` to its biome and surface
//! height. The chunk generator only sees this trait, so tests plug in
//! closures and the world plugs in noise.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::biome::{Biome, BiomeTable};
use crate::noise::{NoiseLayer, NoiseLayerConfig, WorldSeed};

/// Terrain at one world column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerrainSample {
    /// Biome of the column.
    pub biome: Biome,
    /// Highest solid voxel z of the column.
    pub height: i32,
}

impl TerrainSample {
    /// Creates a sample.
    #[inline]
    #[must_use]
    pub const fn new(biome: Biome, height: i32) -> Self {
        Self { biome, height }
    }
}

/// Column -> (biome, height). Called from worker threads.
pub trait TerrainFn: Send + Sync {
    /// Samples the column at world voxel `(x, y)`.
    fn sample(&self, x: i32, y: i32) -> TerrainSample;
}

impl<F> TerrainFn for F
where
    F: Fn(i32, i32) -> TerrainSample + Send + Sync,
{
    #[inline]
    fn sample(&self, x: i32, y: i32) -> TerrainSample {
        self(x, y)
    }
}

/// Same biome and height everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatTerrain {
    sample: TerrainSample,
}

impl FlatTerrain {
    /// Creates a flat terrain.
    #[must_use]
    pub const fn new(biome: Biome, height: i32) -> Self {
        Self {
            sample: TerrainSample::new(biome, height),
        }
    }
}

impl TerrainFn for FlatTerrain {
    #[inline]
    fn sample(&self, _x: i32, _y: i32) -> TerrainSample {
        self.sample
    }
}

/// Noise terrain settings (`[terrain]` with `mode = "noise"`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseTerrainConfig {
    /// Temperature layer.
    pub temperature: NoiseLayerConfig,
    /// Habitability layer.
    pub habitability: NoiseLayerConfig,
    /// Elevation layer; also drives the height.
    pub elevation: NoiseLayerConfig,
    /// Height at elevation 0.
    pub surface_min_height: i32,
    /// Height at elevation 1.
    pub surface_max_height: i32,
    /// Elevation is raised to this power before scaling. Values above 1
    /// flatten lowlands and sharpen peaks.
    pub height_exponent: f64,
}

impl Default for NoiseTerrainConfig {
    fn default() -> Self {
        Self {
            temperature: NoiseLayerConfig {
                seed: 1,
                frequency: 0.0005,
                octaves: 4,
                ..NoiseLayerConfig::default()
            },
            habitability: NoiseLayerConfig {
                seed: 2,
                frequency: 0.0007,
                octaves: 4,
                ..NoiseLayerConfig::default()
            },
            elevation: NoiseLayerConfig {
                seed: 3,
                frequency: 0.004,
                octaves: 6,
                ..NoiseLayerConfig::default()
            },
            surface_min_height: 8,
            surface_max_height: 48,
            height_exponent: 1.0,
        }
    }
}

/// Terrain from three noise layers and a biome table.
pub struct NoiseTerrain {
    temperature: NoiseLayer,
    habitability: NoiseLayer,
    elevation: NoiseLayer,
    min_height: i32,
    max_height: i32,
    exponent: f64,
    biomes: Arc<BiomeTable>,
}

impl NoiseTerrain {
    /// Builds the layers for a world seed.
    #[must_use]
    pub fn new(config: &NoiseTerrainConfig, seed: WorldSeed, biomes: Arc<BiomeTable>) -> Self {
        Self {
            temperature: NoiseLayer::new(&config.temperature, seed),
            habitability: NoiseLayer::new(&config.habitability, seed),
            elevation: NoiseLayer::new(&config.elevation, seed),
            min_height: config.surface_min_height,
            max_height: config.surface_max_height.max(config.surface_min_height),
            exponent: config.height_exponent,
            biomes,
        }
    }

    /// `floor(min + elevation^exponent * (max - min))`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn height_at(&self, elevation: f64) -> i32 {
        let span = f64::from(self.max_height - self.min_height);
        let scaled = elevation.clamp(0.0, 1.0).powf(self.exponent) * span;
        self.min_height + scaled.floor() as i32
    }
}

impl TerrainFn for NoiseTerrain {
    fn sample(&self, x: i32, y: i32) -> TerrainSample {
        let elevation = self.elevation.sample01(x, y);
        let biome = self.biomes.classify(
            self.temperature.sample01(x, y),
            self.habitability.sample01(x, y),
            elevation,
        );
        TerrainSample::new(biome, self.height_at(elevation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeDefinition;
    use bloxels_core::VoxelRegistry;

    fn noise_terrain(config: &NoiseTerrainConfig) -> NoiseTerrain {
        let registry = VoxelRegistry::with_defaults();
        let biomes = BiomeTable::resolve(&BiomeDefinition::defaults(), &registry).unwrap();
        NoiseTerrain::new(config, WorldSeed::new(7), Arc::new(biomes))
    }

    #[test]
    fn test_closure_terrain() {
        let terrain = |x: i32, _y: i32| TerrainSample::new(Biome::Plains, x / 2);

        assert_eq!(terrain.sample(10, 99).height, 5);
        assert_eq!(terrain.sample(10, 99).biome, Biome::Plains);
    }

    #[test]
    fn test_flat_terrain() {
        let terrain = FlatTerrain::new(Biome::Desert, 12);

        assert_eq!(terrain.sample(-500, 9000), TerrainSample::new(Biome::Desert, 12));
    }

    #[test]
    fn test_noise_heights_in_range() {
        let config = NoiseTerrainConfig::default();
        let terrain = noise_terrain(&config);

        for i in -100..100 {
            let sample = terrain.sample(i * 37, i * -53);
            assert!(sample.height >= config.surface_min_height);
            assert!(sample.height <= config.surface_max_height);
        }
    }

    #[test]
    fn test_noise_deterministic() {
        let config = NoiseTerrainConfig::default();
        let a = noise_terrain(&config);
        let b = noise_terrain(&config);

        for i in 0..100 {
            assert_eq!(a.sample(i * 11, i * 7), b.sample(i * 11, i * 7));
        }
    }

    #[test]
    fn test_height_mapping() {
        let config = NoiseTerrainConfig {
            surface_min_height: 10,
            surface_max_height: 30,
            height_exponent: 2.0,
            ..NoiseTerrainConfig::default()
        };
        let terrain = noise_terrain(&config);

        assert_eq!(terrain.height_at(0.0), 10);
        assert_eq!(terrain.height_at(0.5), 15);
        assert_eq!(terrain.height_at(1.0), 30);
    }

    #[test]
    fn test_disabled_elevation_is_flat() {
        let config = NoiseTerrainConfig {
            elevation: NoiseLayerConfig {
                enabled: false,
                ..NoiseLayerConfig::default()
            },
            ..NoiseTerrainConfig::default()
        };
        let terrain = noise_terrain(&config);

        // elevation 0 always classifies as ocean floor
        for i in 0..20 {
            let sample = terrain.sample(i * 100, i * 50);
            assert_eq!(sample.height, config.surface_min_height);
            assert_eq!(sample.biome, Biome::Ocean);
        }
    }
}

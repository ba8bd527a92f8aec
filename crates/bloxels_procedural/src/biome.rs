//! # Biomes
//!
//! A biome contributes two things to generation:
//!
//! 1. **Noise ranges** - boxes in (temperature, habitability, elevation)
//!    space; the first biome with a box containing a column's noise
//!    triple wins.
//! 2. **Surface bands** - an ordered list of `(block, blocks_from_surface,
//!    num_blocks)`; the first band whose range contains a voxel's height
//!    decides its block.
//!
//! Definitions name blocks by string (they come from config); `BiomeTable`
//! resolves them against a `VoxelRegistry` once, so generation only deals
//! with IDs.

use serde::{Deserialize, Serialize};

use bloxels_core::{BlockTypeId, VoxelError, VoxelRegistry, VoxelResult};

/// Biome identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    /// No biome matched; generation uses plain stone.
    #[default]
    None,
    /// Deep water.
    Ocean,
    /// Shoreline.
    Coast,
    /// Frozen flats.
    Tundra,
    /// Grassland.
    Plains,
    /// Sand dunes.
    Desert,
    /// Dense humid forest.
    Jungle,
    /// High exposed rock.
    RockyMountain,
    /// Temperate forest.
    Forest,
}

/// Inclusive box in noise space. All values are in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeNoiseRange {
    /// Lower temperature bound.
    pub min_temperature: f64,
    /// Upper temperature bound.
    pub max_temperature: f64,
    /// Lower habitability bound.
    pub min_habitability: f64,
    /// Upper habitability bound.
    pub max_habitability: f64,
    /// Lower elevation bound.
    pub min_elevation: f64,
    /// Upper elevation bound.
    pub max_elevation: f64,
}

impl BiomeNoiseRange {
    /// A range that matches every triple.
    pub const EVERYWHERE: Self = Self {
        min_temperature: 0.0,
        max_temperature: 1.0,
        min_habitability: 0.0,
        max_habitability: 1.0,
        min_elevation: 0.0,
        max_elevation: 1.0,
    };

    /// Returns true if the triple lies inside the box.
    #[must_use]
    pub fn contains(&self, temperature: f64, habitability: f64, elevation: f64) -> bool {
        (self.min_temperature..=self.max_temperature).contains(&temperature)
            && (self.min_habitability..=self.max_habitability).contains(&habitability)
            && (self.min_elevation..=self.max_elevation).contains(&elevation)
    }
}

/// A surface band as written in config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceBandDef {
    /// Block name.
    pub block: String,
    /// Depth of the band's top below the terrain height (0 = top block).
    #[serde(default)]
    pub blocks_from_surface: i32,
    /// Extra voxels below the band's top.
    #[serde(default)]
    pub num_blocks: i32,
}

/// A surface band resolved to a block ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceBand {
    /// Block placed inside the band.
    pub block: BlockTypeId,
    /// Depth of the band's top below the terrain height.
    pub blocks_from_surface: i32,
    /// Extra voxels below the band's top.
    pub num_blocks: i32,
}

impl SurfaceBand {
    /// Returns true if height `z` falls in `[top - num_blocks, top]` where
    /// `top = terrain_height - blocks_from_surface`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, z: i32, terrain_height: i32) -> bool {
        let top = terrain_height - self.blocks_from_surface;
        z >= top - self.num_blocks && z <= top
    }
}

/// A biome as written in config (`[[biomes]]`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDefinition {
    /// Which biome this row describes.
    pub biome: Biome,
    /// Noise boxes that select this biome.
    #[serde(default)]
    pub noise_ranges: Vec<BiomeNoiseRange>,
    /// Surface bands, in priority order.
    #[serde(default)]
    pub surface: Vec<SurfaceBandDef>,
}

impl BiomeDefinition {
    fn band(block: &str, blocks_from_surface: i32, num_blocks: i32) -> SurfaceBandDef {
        SurfaceBandDef {
            block: block.to_string(),
            blocks_from_surface,
            num_blocks,
        }
    }

    fn range(temperature: (f64, f64), habitability: (f64, f64), elevation: (f64, f64)) -> BiomeNoiseRange {
        BiomeNoiseRange {
            min_temperature: temperature.0,
            max_temperature: temperature.1,
            min_habitability: habitability.0,
            max_habitability: habitability.1,
            min_elevation: elevation.0,
            max_elevation: elevation.1,
        }
    }

    /// The built-in biome set, matched in order.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                biome: Biome::Ocean,
                noise_ranges: vec![Self::range((0.0, 1.0), (0.0, 1.0), (0.0, 0.3))],
                surface: vec![Self::band("Sand", 0, 2)],
            },
            Self {
                biome: Biome::RockyMountain,
                noise_ranges: vec![Self::range((0.0, 1.0), (0.0, 1.0), (0.75, 1.0))],
                surface: vec![Self::band("Snow", 0, 0)],
            },
            Self {
                biome: Biome::Tundra,
                noise_ranges: vec![Self::range((0.0, 0.3), (0.0, 1.0), (0.3, 0.75))],
                surface: vec![Self::band("Snow", 0, 0), Self::band("Dirt", 1, 2)],
            },
            Self {
                biome: Biome::Desert,
                noise_ranges: vec![Self::range((0.7, 1.0), (0.0, 0.4), (0.3, 0.75))],
                surface: vec![Self::band("Sand", 0, 4)],
            },
            Self {
                biome: Biome::Forest,
                noise_ranges: vec![Self::range((0.3, 0.7), (0.6, 1.0), (0.3, 0.75))],
                surface: vec![Self::band("Grass", 0, 0), Self::band("Dirt", 1, 4)],
            },
            Self {
                biome: Biome::Plains,
                noise_ranges: vec![BiomeNoiseRange::EVERYWHERE],
                surface: vec![Self::band("Grass", 0, 0), Self::band("Dirt", 1, 2)],
            },
        ]
    }
}

#[derive(Clone, Debug)]
struct BiomeEntry {
    biome: Biome,
    noise_ranges: Vec<BiomeNoiseRange>,
    bands: Vec<SurfaceBand>,
}

/// Biome definitions resolved against a registry.
#[derive(Clone, Debug, Default)]
pub struct BiomeTable {
    entries: Vec<BiomeEntry>,
}

impl BiomeTable {
    /// Resolves block names in every surface band.
    ///
    /// # Errors
    ///
    /// `MissingBlock` if a band names an unregistered block. A typo in a
    /// biome table would otherwise silently generate Air.
    pub fn resolve(definitions: &[BiomeDefinition], registry: &VoxelRegistry) -> VoxelResult<Self> {
        let mut entries = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let bands = definition
                .surface
                .iter()
                .map(|band| {
                    registry
                        .try_id(&band.block)
                        .map(|block| SurfaceBand {
                            block,
                            blocks_from_surface: band.blocks_from_surface,
                            num_blocks: band.num_blocks,
                        })
                        .ok_or_else(|| VoxelError::MissingBlock(band.block.clone()))
                })
                .collect::<VoxelResult<Vec<_>>>()?;

            entries.push(BiomeEntry {
                biome: definition.biome,
                noise_ranges: definition.noise_ranges.clone(),
                bands,
            });
        }
        Ok(Self { entries })
    }

    /// Surface bands of a biome; empty for unknown biomes.
    #[must_use]
    pub fn surface_bands(&self, biome: Biome) -> &[SurfaceBand] {
        self.entries
            .iter()
            .find(|entry| entry.biome == biome)
            .map_or(&[], |entry| entry.bands.as_slice())
    }

    /// First biome whose noise range contains the triple, else `None`.
    #[must_use]
    pub fn classify(&self, temperature: f64, habitability: f64, elevation: f64) -> Biome {
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .noise_ranges
                    .iter()
                    .any(|range| range.contains(temperature, habitability, elevation))
            })
            .map_or(Biome::None, |entry| entry.biome)
    }

    /// Number of biomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (BiomeTable, VoxelRegistry) {
        let registry = VoxelRegistry::with_defaults();
        let table = BiomeTable::resolve(&BiomeDefinition::defaults(), &registry).unwrap();
        (table, registry)
    }

    #[test]
    fn test_band_range() {
        let band = SurfaceBand {
            block: BlockTypeId(3),
            blocks_from_surface: 1,
            num_blocks: 2,
        };

        // height 10: top = 9, covers 7..=9
        assert!(!band.contains(10, 10));
        assert!(band.contains(9, 10));
        assert!(band.contains(7, 10));
        assert!(!band.contains(6, 10));
    }

    #[test]
    fn test_classification_order() {
        let (table, _) = table();

        assert_eq!(table.classify(0.5, 0.5, 0.1), Biome::Ocean);
        assert_eq!(table.classify(0.5, 0.5, 0.9), Biome::RockyMountain);
        assert_eq!(table.classify(0.1, 0.5, 0.5), Biome::Tundra);
        assert_eq!(table.classify(0.9, 0.1, 0.5), Biome::Desert);
        assert_eq!(table.classify(0.5, 0.8, 0.5), Biome::Forest);
        assert_eq!(table.classify(0.5, 0.5, 0.5), Biome::Plains);
    }

    #[test]
    fn test_unmatched_is_none() {
        let registry = VoxelRegistry::with_defaults();
        let definitions = vec![BiomeDefinition {
            biome: Biome::Desert,
            noise_ranges: vec![BiomeNoiseRange {
                min_temperature: 0.9,
                ..BiomeNoiseRange::EVERYWHERE
            }],
            surface: Vec::new(),
        }];
        let table = BiomeTable::resolve(&definitions, &registry).unwrap();

        assert_eq!(table.classify(0.2, 0.2, 0.2), Biome::None);
        assert!(table.surface_bands(Biome::None).is_empty());
    }

    #[test]
    fn test_resolve_rejects_unknown_block() {
        let registry = VoxelRegistry::with_defaults();
        let definitions = vec![BiomeDefinition {
            biome: Biome::Plains,
            noise_ranges: vec![BiomeNoiseRange::EVERYWHERE],
            surface: vec![SurfaceBandDef {
                block: "Moss".to_string(),
                blocks_from_surface: 0,
                num_blocks: 0,
            }],
        }];

        assert_eq!(
            BiomeTable::resolve(&definitions, &registry).unwrap_err(),
            VoxelError::MissingBlock("Moss".to_string())
        );
    }

    #[test]
    fn test_surface_bands_resolved() {
        let (table, registry) = table();
        let bands = table.surface_bands(Biome::Plains);

        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].block, registry.id_from_name("Grass"));
        assert_eq!(bands[1].block, registry.id_from_name("Dirt"));
    }

    #[test]
    fn test_definitions_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            biomes: Vec<BiomeDefinition>,
        }

        let doc: Doc = toml::from_str(
            r#"
            [[biomes]]
            biome = "Jungle"
            noise_ranges = [{ min_temperature = 0.6, max_temperature = 1.0, min_habitability = 0.7, max_habitability = 1.0, min_elevation = 0.0, max_elevation = 1.0 }]
            surface = [{ block = "Grass" }, { block = "Dirt", blocks_from_surface = 1, num_blocks = 3 }]
            "#,
        )
        .unwrap();

        assert_eq!(doc.biomes[0].biome, Biome::Jungle);
        assert_eq!(doc.biomes[0].surface[0].num_blocks, 0);
        assert_eq!(doc.biomes[0].surface[1].num_blocks, 3);
    }
}

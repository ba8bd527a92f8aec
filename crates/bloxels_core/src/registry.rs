//! # Voxel Registry
//!
//! Maps block-type names to small integer IDs and to their properties.
//!
//! IDs are assigned sequentially in registration order. By convention the
//! first registered type is Air, so `BlockTypeId::AIR` (ID 0) is Air for
//! every registry built from `with_defaults` or from a config that lists
//! Air first.
//!
//! Definitions live in a contiguous vector indexed by ID, so property
//! lookups on the meshing and pathfinding hot paths are a bounds check and
//! an index.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{VoxelError, VoxelResult};
use crate::mesh::{FaceDirection, FaceOrientation};

/// Block type ID (16-bit). Only meaningful within one registry instance.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable,
)]
pub struct BlockTypeId(pub u16);

impl BlockTypeId {
    /// Air (always ID 0).
    pub const AIR: Self = Self(0);

    /// Creates a new block type ID.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns true for ID 0.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Texture atlas tile offsets, one per face orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileOffsets {
    /// Tile used by the +Z face.
    #[serde(default)]
    pub top: [i32; 2],
    /// Tile used by the -Z face.
    #[serde(default)]
    pub bottom: [i32; 2],
    /// Tile used by the four side faces.
    #[serde(default)]
    pub side: [i32; 2],
}

/// Properties of one block type. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelDefinition {
    /// Internal name, PascalCase (e.g. `StoneBrick`).
    pub name: String,
    /// Used for footing and collision.
    #[serde(default)]
    pub is_solid: bool,
    /// Faces of neighboring blocks behind this one are rendered.
    #[serde(default)]
    pub is_transparent: bool,
    /// The block itself is never rendered.
    #[serde(default)]
    pub is_invisible: bool,
    /// Render hints for material selection.
    #[serde(default)]
    pub tiles: TileOffsets,
}

impl VoxelDefinition {
    /// Creates a definition with every flag cleared.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_solid: false,
            is_transparent: false,
            is_invisible: false,
            tiles: TileOffsets::default(),
        }
    }

    /// Air: not solid, transparent and invisible.
    #[must_use]
    pub fn air() -> Self {
        Self::new("Air").transparent().invisible()
    }

    /// A solid, opaque, visible block.
    #[must_use]
    pub fn solid(name: impl Into<String>) -> Self {
        Self {
            is_solid: true,
            ..Self::new(name)
        }
    }

    /// Marks the definition transparent.
    #[must_use]
    pub fn transparent(mut self) -> Self {
        self.is_transparent = true;
        self
    }

    /// Marks the definition invisible.
    #[must_use]
    pub fn invisible(mut self) -> Self {
        self.is_invisible = true;
        self
    }

    /// Sets the atlas tiles.
    #[must_use]
    pub fn with_tiles(mut self, top: [i32; 2], bottom: [i32; 2], side: [i32; 2]) -> Self {
        self.tiles = TileOffsets { top, bottom, side };
        self
    }

    /// Returns the atlas tile for a face.
    #[must_use]
    pub fn tile_for(&self, face: FaceDirection) -> [i32; 2] {
        match face.orientation() {
            FaceOrientation::Top => self.tiles.top,
            FaceOrientation::Bottom => self.tiles.bottom,
            FaceOrientation::Side => self.tiles.side,
        }
    }
}

/// Name <-> ID <-> definition lookup table.
///
/// Loaded once and then shared read-only (`Arc<VoxelRegistry>`) by the
/// generator, the mesher workers and the pathfinder.
#[derive(Debug, Clone)]
pub struct VoxelRegistry {
    /// Definitions indexed by ID.
    definitions: Vec<VoxelDefinition>,
    /// Reverse lookup.
    name_to_id: HashMap<String, BlockTypeId>,
    /// Returned for unregistered IDs. Behaves like Air, has an empty name.
    fallback: VoxelDefinition,
}

impl VoxelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            name_to_id: HashMap::new(),
            fallback: VoxelDefinition::new("").transparent().invisible(),
        }
    }

    /// Creates a registry with the built-in block set.
    ///
    /// Air is registered first so it receives ID 0.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for definition in Self::default_definitions() {
            // The built-in names are distinct and far below the ID limit.
            let _ = registry.register(definition);
        }
        registry
    }

    /// The built-in block set, Air first.
    #[must_use]
    pub fn default_definitions() -> Vec<VoxelDefinition> {
        vec![
            VoxelDefinition::air(),
            VoxelDefinition::solid("Stone").with_tiles([1, 0], [1, 0], [1, 0]),
            VoxelDefinition::solid("Obsidian").with_tiles([5, 0], [5, 0], [5, 0]),
            VoxelDefinition::solid("Dirt").with_tiles([2, 0], [2, 0], [2, 0]),
            VoxelDefinition::solid("Grass").with_tiles([0, 0], [2, 0], [3, 0]),
            VoxelDefinition::solid("Sand").with_tiles([4, 0], [4, 0], [4, 0]),
            VoxelDefinition::solid("Snow").with_tiles([6, 0], [2, 0], [7, 0]),
            VoxelDefinition::new("Water")
                .transparent()
                .with_tiles([8, 0], [8, 0], [8, 0]),
            VoxelDefinition::solid("Glass")
                .transparent()
                .with_tiles([9, 0], [9, 0], [9, 0]),
        ]
    }

    /// Builds a registry from a list of definitions, in order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBlock` if a name appears twice, or `RegistryFull`
    /// past 65 536 entries.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = VoxelDefinition>,
    ) -> VoxelResult<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Registers a block type and returns its ID (the next sequential ID).
    ///
    /// # Errors
    ///
    /// Re-registering a name is a caller error and is rejected so the
    /// name <-> ID mapping stays a bijection.
    pub fn register(&mut self, definition: VoxelDefinition) -> VoxelResult<BlockTypeId> {
        if self.name_to_id.contains_key(&definition.name) {
            return Err(VoxelError::DuplicateBlock(definition.name));
        }
        let raw = u16::try_from(self.definitions.len())
            .map_err(|_| VoxelError::RegistryFull(self.definitions.len()))?;
        let id = BlockTypeId(raw);

        tracing::debug!(
            "Registered voxel {} as ID {} (solid: {}, transparent: {}, invisible: {})",
            definition.name,
            raw,
            definition.is_solid,
            definition.is_transparent,
            definition.is_invisible
        );

        self.name_to_id.insert(definition.name.clone(), id);
        self.definitions.push(definition);
        Ok(id)
    }

    /// Looks up an ID by name, falling back to Air for unknown names.
    #[must_use]
    pub fn id_from_name(&self, name: &str) -> BlockTypeId {
        self.try_id(name).unwrap_or_else(|| {
            tracing::warn!("Unknown voxel name {name:?}, using Air");
            BlockTypeId::AIR
        })
    }

    /// Looks up an ID by name without a fallback.
    #[inline]
    #[must_use]
    pub fn try_id(&self, name: &str) -> Option<BlockTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Returns the name for an ID, or an empty string for unknown IDs.
    #[inline]
    #[must_use]
    pub fn name_from_id(&self, id: BlockTypeId) -> &str {
        &self.definition(id).name
    }

    /// Returns the definition for an ID.
    ///
    /// Unregistered IDs get the fallback definition, which behaves like Air.
    #[inline]
    #[must_use]
    pub fn definition(&self, id: BlockTypeId) -> &VoxelDefinition {
        match self.definitions.get(usize::from(id.0)) {
            Some(definition) => definition,
            None => {
                tracing::trace!("Unregistered voxel ID {}, using fallback", id.0);
                &self.fallback
            }
        }
    }

    /// Returns true if the ID is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: BlockTypeId) -> bool {
        usize::from(id.0) < self.definitions.len()
    }

    /// Air is ID 0; unregistered IDs are treated as Air.
    #[inline]
    #[must_use]
    pub fn is_air(&self, id: BlockTypeId) -> bool {
        id.is_air() || !self.contains(id)
    }

    /// Returns true if the block provides footing.
    #[inline]
    #[must_use]
    pub fn is_solid(&self, id: BlockTypeId) -> bool {
        self.definition(id).is_solid
    }

    /// Returns true if faces behind this block stay visible.
    #[inline]
    #[must_use]
    pub fn is_transparent(&self, id: BlockTypeId) -> bool {
        self.definition(id).is_transparent
    }

    /// Returns true if the block is never rendered.
    #[inline]
    #[must_use]
    pub fn is_invisible(&self, id: BlockTypeId) -> bool {
        self.definition(id).is_invisible
    }

    /// Number of registered block types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates `(id, definition)` pairs in ID order.
    #[allow(clippy::cast_possible_truncation)] // register() caps the length at u16 range
    pub fn iter(&self) -> impl Iterator<Item = (BlockTypeId, &VoxelDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (BlockTypeId(index as u16), definition))
    }
}

impl Default for VoxelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

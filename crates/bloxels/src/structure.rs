//! # Structure Documents
//!
//! JSON snapshots of a voxel region, stored relative to an origin voxel:
//!
//! ```json
//! { "Voxels": [ { "Offset": [0, 0, 0], "ID": "Stone" } ] }
//! ```
//!
//! Block names are resolved against the registry at import time. The
//! `"AirForced"` sentinel imports as `"Air"`, which lets a structure carve
//! space out of existing terrain.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use bloxels_core::VoxelCoord;

/// Block name that imports as Air.
pub const AIR_FORCED: &str = "AirForced";

/// Errors reading or writing a structure document.
#[derive(Error, Debug)]
pub enum StructureError {
    /// The document is not valid structure JSON.
    #[error("malformed structure document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One voxel entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureVoxel {
    /// Offset from the origin voxel. Must have three components.
    #[serde(rename = "Offset")]
    pub offset: Vec<i32>,
    /// Block name.
    #[serde(rename = "ID")]
    pub id: String,
}

impl StructureVoxel {
    /// Creates an entry.
    #[must_use]
    pub fn new(offset: [i32; 3], id: impl Into<String>) -> Self {
        Self {
            offset: offset.to_vec(),
            id: id.into(),
        }
    }

    /// The offset, if it has exactly three components.
    #[must_use]
    pub fn offset3(&self) -> Option<[i32; 3]> {
        <[i32; 3]>::try_from(self.offset.as_slice()).ok()
    }

    /// Block name to look up, with `AirForced` mapped to `Air`.
    #[must_use]
    pub fn block_name(&self) -> &str {
        if self.id == AIR_FORCED {
            "Air"
        } else {
            &self.id
        }
    }
}

/// A structure: a list of voxels relative to an origin.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDocument {
    /// Voxel entries.
    #[serde(rename = "Voxels", default)]
    pub voxels: Vec<StructureVoxel>,
}

impl StructureDocument {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// `StructureError::Json` if the text is not a structure document.
    pub fn from_json(text: &str) -> Result<Self, StructureError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// `StructureError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, StructureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of entries, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Resolves entries against `origin` into world voxels and block
    /// names. Entries whose offset is not three components long are
    /// skipped with a warning.
    #[must_use]
    pub fn placements(&self, origin: VoxelCoord) -> Vec<(VoxelCoord, &str)> {
        self.voxels
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let Some([dx, dy, dz]) = entry.offset3() else {
                    warn!(
                        index,
                        components = entry.offset.len(),
                        "structure entry offset is not three components, skipped"
                    );
                    return None;
                };
                Some((origin.offset(dx, dy, dz), entry.block_name()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pascal_case() {
        let doc =
            StructureDocument::from_json(r#"{"Voxels":[{"Offset":[1,-2,3],"ID":"Stone"}]}"#)
                .unwrap();

        assert_eq!(doc.voxels, vec![StructureVoxel::new([1, -2, 3], "Stone")]);
    }

    #[test]
    fn test_serialized_keys() {
        let doc = StructureDocument {
            voxels: vec![StructureVoxel::new([0, 0, 0], "Dirt")],
        };
        let text = doc.to_json().unwrap();

        assert!(text.contains("\"Voxels\""));
        assert!(text.contains("\"Offset\""));
        assert!(text.contains("\"ID\": \"Dirt\""));
        assert_eq!(StructureDocument::from_json(&text).unwrap(), doc);
    }

    #[test]
    fn test_air_forced_maps_to_air() {
        let entry = StructureVoxel::new([0, 0, 0], AIR_FORCED);

        assert_eq!(entry.block_name(), "Air");
        assert_eq!(StructureVoxel::new([0, 0, 0], "Sand").block_name(), "Sand");
    }

    #[test]
    fn test_bad_offsets_skipped() {
        let doc = StructureDocument::from_json(
            r#"{"Voxels":[
                {"Offset":[0,0],"ID":"Stone"},
                {"Offset":[1,1,1],"ID":"Stone"},
                {"Offset":[1,2,3,4],"ID":"Stone"}
            ]}"#,
        )
        .unwrap();

        let placed = doc.placements(VoxelCoord::new(10, 10, 10));

        assert_eq!(doc.len(), 3);
        assert_eq!(placed, vec![(VoxelCoord::new(11, 11, 11), "Stone")]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            StructureDocument::from_json("{\"Voxels\": 5}"),
            Err(StructureError::Json(_))
        ));
    }

    #[test]
    fn test_missing_voxels_key_is_empty() {
        assert!(StructureDocument::from_json("{}").unwrap().is_empty());
    }
}

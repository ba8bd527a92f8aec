//! Move costs and search limits (`[pathfinding]` config table).

use serde::{Deserialize, Serialize};

/// Integer cost model. One straight step is the unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCosts {
    /// Cost of a straight horizontal step.
    pub straight: u32,
    /// Cost of a diagonal horizontal step (about `straight * sqrt(2)`).
    pub diagonal: u32,
    /// Extra cost per voxel climbed.
    pub step_up: u32,
    /// Extra cost per voxel fallen.
    pub fall_per_voxel: u32,
    /// Highest climb in one move.
    pub max_step_up: u32,
    /// Deepest drop in one move.
    pub max_fall: u32,
    /// Multiplier on the Euclidean heuristic. Above 1 trades path quality
    /// for fewer expansions.
    pub heuristic_weight: f32,
    /// Expanded nodes before the search gives up.
    pub max_expanded_nodes: usize,
}

impl Default for PathCosts {
    fn default() -> Self {
        Self {
            straight: 10,
            diagonal: 14,
            step_up: 5,
            fall_per_voxel: 3,
            max_step_up: 1,
            max_fall: 3,
            heuristic_weight: 1.0,
            max_expanded_nodes: 100_000,
        }
    }
}

//! # Bloxels Pathfinding
//!
//! Point-to-point paths over the voxel grid for ground-bound agents.
//!
//! ## Walkability
//!
//! ```text
//!   [air]    <- headroom
//!   [air]    <- the walkable voxel
//!   [solid]  <- footing
//! ```
//!
//! ## Guarantees
//!
//! 1. **Whole paths only**: either every waypoint from start to goal, or
//!    a `PathNotFound` reason
//! 2. **Deterministic**: same grid, same endpoints, same path
//! 3. **Isolated**: each query owns its node storage, so concurrent
//!    queries never interfere
//!
//! ## Example
//!
//! ```rust,ignore
//! use bloxels_pathfinding::{PathCosts, VoxelPathfinder};
//!
//! let finder = VoxelPathfinder::new(PathCosts::default(), 100.0);
//! let waypoints = finder.find_path(&world, [50.0, 50.0, 1050.0], [950.0, 50.0, 1050.0])?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod astar;
pub mod costs;
pub mod error;
pub mod query;

pub use astar::VoxelPathfinder;
pub use costs::PathCosts;
pub use error::PathNotFound;
pub use query::VoxelQuery;

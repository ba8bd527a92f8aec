//! # Bloxels Meshing
//!
//! Converts chunk voxels into renderable surfaces.
//!
//! ## Pipeline
//!
//! ```text
//! ChunkStore ──snapshot──► ChunkNeighborhood ──GreedyMesher──► ChunkMesh
//!   (locked)               (center + 6 faces)                  (block, face) buckets
//! ```
//!
//! The mesher reads through `NeighborFaceQuery`, so anything that can
//! answer chunk-local lookups (including one step into a neighbor) can be
//! meshed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bloxels_meshing::GreedyMesher;
//!
//! let mut mesher = GreedyMesher::new();
//! let mesh = mesher.mesh(&store.neighborhood(coord)?, &registry, 100.0, &token);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod greedy;

pub use greedy::{GreedyMesher, MeshStats, NeighborFaceQuery};

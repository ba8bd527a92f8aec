//! # Bloxels
//!
//! A chunk-streamed voxel world: terrain generation, greedy meshing and
//! ground pathfinding, driven by a lifecycle scheduler around an observer.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────── coordination thread ──────────────────────────────┐
//! │  VoxelWorld ──► ChunkLifecycleScheduler ──submit──► TaskExecutor ──drain──┐     │
//! │      │                 │  ▲                                               │     │
//! │      │ edits/queries   │  └───────────── results (liveness checked) ◄─────┘     │
//! │      ▼                 ▼                                                        │
//! │  ChunkStore (RwLock)  MeshPool (free list)                                      │
//! └─────────────────────────────────────────────────────────────────────────────────┘
//!                  │ jobs                       ▲ results
//!                  ▼                            │
//!        WorkerPool threads: ChunkGenerator / GreedyMesher
//! ```
//!
//! ## Crates
//!
//! - `bloxels_core`: registry, coordinates, chunks, store, mesh model
//! - `bloxels_procedural`: noise, biomes, terrain, chunk generation
//! - `bloxels_meshing`: greedy mesher
//! - `bloxels_pathfinding`: A* over walkable voxels
//!
//! ## Example
//!
//! ```rust,ignore
//! use bloxels::{VoxelWorld, WorldConfig};
//!
//! let mut world = VoxelWorld::new(WorldConfig::default())?;
//! world.set_observer_position([0.0, 0.0, 3000.0]);
//! while !world.is_idle() {
//!     world.tick();
//! }
//! let path = world.find_path(start, end)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod structure;
pub mod workers;
pub mod world;

pub use config::{StreamingConfig, TerrainConfig, WorldConfig};
pub use error::{WorldError, WorldResult};
pub use executor::{DeferredExecutor, InlineExecutor, Job, JobContext, JobResult, TaskExecutor};
pub use scheduler::{ChunkLifecycleScheduler, ChunkState, SchedulerEvent, SchedulerStats};
pub use structure::{StructureDocument, StructureError, StructureVoxel, AIR_FORCED};
pub use workers::{WorkerPool, WorkerStats};
pub use world::{ImportReport, VoxelWorld, WorldQuery};

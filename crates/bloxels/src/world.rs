//! # Voxel World
//!
//! The facade game code talks to. It owns the registry, the chunk store,
//! the mesh pool and the lifecycle scheduler, and exposes:
//!
//! - observer movement and the per-frame `tick`
//! - voxel reads and edits (edits re-mesh the chunks they touch)
//! - pathfinding over the loaded voxels
//! - structure import and export
//!
//! ```rust,ignore
//! let mut world = VoxelWorld::new(WorldConfig::load("world.toml")?)?;
//! world.set_observer_position([0.0, 0.0, 2000.0]);
//! loop {
//!     for event in world.tick() { /* upload meshes on Displayed */ }
//! }
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use bloxels_core::{
    BlockTypeId, ChunkCoord, ChunkGeometry, ChunkMesh, ChunkStore, MeshPool, VoxelCoord,
    VoxelRegistry,
};
use bloxels_pathfinding::{PathNotFound, VoxelPathfinder, VoxelQuery};
use bloxels_procedural::{ChunkGenerator, TerrainFn};

use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};
use crate::executor::{InlineExecutor, JobContext, TaskExecutor};
use crate::scheduler::{ChunkLifecycleScheduler, ChunkState, SchedulerEvent, SchedulerStats};
use crate::structure::{StructureDocument, StructureVoxel};
use crate::workers::WorkerPool;

/// Pathfinding view of the loaded world. Unloaded voxels read as Air.
#[derive(Clone, Copy)]
pub struct WorldQuery<'a> {
    store: &'a ChunkStore,
    registry: &'a VoxelRegistry,
}

impl<'a> WorldQuery<'a> {
    /// Creates a view over a store.
    #[must_use]
    pub const fn new(store: &'a ChunkStore, registry: &'a VoxelRegistry) -> Self {
        Self { store, registry }
    }
}

impl VoxelQuery for WorldQuery<'_> {
    fn is_air(&self, voxel: VoxelCoord) -> bool {
        self.registry.is_air(self.store.voxel(voxel))
    }

    fn is_solid(&self, voxel: VoxelCoord) -> bool {
        self.registry.is_solid(self.store.voxel(voxel))
    }
}

/// Outcome of a structure import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Voxels written.
    pub placed: usize,
    /// Entries skipped for a malformed offset.
    pub malformed: usize,
    /// Entries whose chunk had no data yet.
    pub unloaded: usize,
    /// Chunks queued for re-meshing.
    pub remeshed_chunks: usize,
}

/// A streamed voxel world.
pub struct VoxelWorld<E: TaskExecutor = WorkerPool> {
    config: WorldConfig,
    geometry: ChunkGeometry,
    registry: Arc<VoxelRegistry>,
    store: Arc<ChunkStore>,
    pool: Arc<MeshPool>,
    terrain: Arc<dyn TerrainFn>,
    pathfinder: VoxelPathfinder,
    scheduler: ChunkLifecycleScheduler<E>,
}

impl VoxelWorld<WorkerPool> {
    /// Builds a world whose jobs run on `streaming.worker_threads` threads.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or a worker thread failing to spawn.
    pub fn new(config: WorldConfig) -> WorldResult<Self> {
        let threads = config.streaming.worker_threads;
        Self::build(config, |context| {
            WorkerPool::new(context, threads).map_err(WorldError::WorkerSpawn)
        })
    }
}

impl VoxelWorld<InlineExecutor> {
    /// Builds a world that runs every job synchronously inside `tick`.
    ///
    /// # Errors
    ///
    /// Invalid configuration.
    pub fn inline(config: WorldConfig) -> WorldResult<Self> {
        Self::build(config, |context| Ok(InlineExecutor::new(context)))
    }
}

impl<E: TaskExecutor> VoxelWorld<E> {
    /// Builds a world with a caller-provided executor.
    ///
    /// # Errors
    ///
    /// Invalid configuration (sizes, duplicate blocks, biome bands naming
    /// unknown blocks, missing Stone or Obsidian), or whatever
    /// `make_executor` returns.
    pub fn build<F>(config: WorldConfig, make_executor: F) -> WorldResult<Self>
    where
        F: FnOnce(JobContext) -> WorldResult<E>,
    {
        config.validate()?;

        let geometry = config.voxel.geometry();
        let registry = Arc::new(config.build_registry()?);
        let biomes = Arc::new(config.build_biomes(&registry)?);
        let terrain = config.terrain.build(config.world_seed(), Arc::clone(&biomes));
        let generator = ChunkGenerator::new(geometry, Arc::clone(&terrain), biomes, &registry)?;

        let pool = Arc::new(MeshPool::new(config.streaming.mesh_pool_capacity));
        let store = Arc::new(ChunkStore::new(geometry));
        let context = JobContext::new(generator, Arc::clone(&registry), Arc::clone(&pool));
        let executor = make_executor(context)?;

        let scheduler = ChunkLifecycleScheduler::new(
            Arc::clone(&store),
            Arc::clone(&pool),
            executor,
            config.streaming,
        );
        let pathfinder = VoxelPathfinder::new(config.pathfinding, geometry.voxel_size());

        info!(
            seed = config.seed,
            chunk_size = geometry.chunk_size(),
            blocks = registry.len(),
            load_radius = config.streaming.load_radius,
            "voxel world ready"
        );

        Ok(Self {
            config,
            geometry,
            registry,
            store,
            pool,
            terrain,
            pathfinder,
            scheduler,
        })
    }

    /// The configuration the world was built from.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Chunk and voxel sizes.
    #[must_use]
    pub const fn geometry(&self) -> &ChunkGeometry {
        &self.geometry
    }

    /// The block registry.
    #[must_use]
    pub fn registry(&self) -> &VoxelRegistry {
        &self.registry
    }

    /// The chunk store.
    #[must_use]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// The mesh buffer pool.
    #[must_use]
    pub fn mesh_pool(&self) -> &MeshPool {
        &self.pool
    }

    /// The lifecycle scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &ChunkLifecycleScheduler<E> {
        &self.scheduler
    }

    /// The lifecycle scheduler, mutably.
    pub fn scheduler_mut(&mut self) -> &mut ChunkLifecycleScheduler<E> {
        &mut self.scheduler
    }

    /// Moves the observer to a world position.
    pub fn set_observer_position(&mut self, position: [f32; 3]) {
        let chunk = self.geometry.world_to_chunk(position);
        self.scheduler.update_observer(chunk);
    }

    /// Moves the observer to a chunk.
    pub fn set_observer_chunk(&mut self, chunk: ChunkCoord) {
        self.scheduler.update_observer(chunk);
    }

    /// Runs one scheduling step.
    pub fn tick(&mut self) -> Vec<SchedulerEvent> {
        self.scheduler.tick()
    }

    /// Scheduler counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Returns true when no chunk work is queued or in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Lifecycle state of a chunk.
    #[must_use]
    pub fn chunk_state(&self, chunk: ChunkCoord) -> ChunkState {
        self.scheduler.state(chunk)
    }

    /// A copy of a chunk's displayed mesh.
    #[must_use]
    pub fn chunk_mesh(&self, chunk: ChunkCoord) -> Option<ChunkMesh> {
        self.store
            .with_chunk(chunk, |c| c.has_mesh().then(|| c.mesh().clone()))
            .flatten()
    }

    /// Reads a voxel. Unloaded voxels read as Air.
    #[must_use]
    pub fn voxel(&self, voxel: VoxelCoord) -> BlockTypeId {
        self.store.voxel(voxel)
    }

    /// Name of the block at a voxel.
    #[must_use]
    pub fn block_name(&self, voxel: VoxelCoord) -> &str {
        self.registry.name_from_id(self.store.voxel(voxel))
    }

    /// Terrain surface height of a world voxel column.
    #[must_use]
    pub fn surface_height(&self, x: i32, y: i32) -> i32 {
        self.terrain.sample(x, y).height
    }

    /// Writes a voxel and returns the previous block.
    ///
    /// Returns `None` without writing if the owning chunk has no data yet.
    /// Re-meshes the owning chunk, and each face neighbor whose border the
    /// voxel sits on.
    pub fn set_voxel(&mut self, voxel: VoxelCoord, id: BlockTypeId) -> Option<BlockTypeId> {
        let mut dirty = BTreeSet::new();
        let previous = self.write_voxel(voxel, id, &mut dirty)?;
        for chunk in dirty {
            self.scheduler.request_remesh(chunk);
        }
        Some(previous)
    }

    /// Places a block by name. Unknown names place Air.
    pub fn place_block(&mut self, voxel: VoxelCoord, name: &str) -> Option<BlockTypeId> {
        let id = self.registry.id_from_name(name);
        self.set_voxel(voxel, id)
    }

    fn write_voxel(
        &self,
        voxel: VoxelCoord,
        id: BlockTypeId,
        dirty: &mut BTreeSet<ChunkCoord>,
    ) -> Option<BlockTypeId> {
        let (chunk, local) = self.geometry.voxel_to_chunk(voxel);
        if !self.store.has_data(chunk) {
            debug!(voxel = %voxel, chunk = %chunk, "edit ignored, chunk has no data");
            return None;
        }
        let previous = self.store.set_voxel(voxel, id)?;

        dirty.insert(chunk);
        let last = self.geometry.chunk_size() - 1;
        for (axis, &position) in local.iter().enumerate() {
            let mut step = [0; 3];
            if position == 0 {
                step[axis] = -1;
            } else if position == last {
                step[axis] = 1;
            } else {
                continue;
            }
            dirty.insert(chunk.offset(step[0], step[1], step[2]));
        }
        Some(previous)
    }

    /// Pathfinding view of the loaded voxels.
    #[must_use]
    pub fn query(&self) -> WorldQuery<'_> {
        WorldQuery::new(&self.store, &self.registry)
    }

    /// Finds a path between two world positions. Waypoints are voxel
    /// origin corners in world units.
    ///
    /// # Errors
    ///
    /// `PathNotFound` with the reason no path exists.
    pub fn find_path(&self, start: [f32; 3], end: [f32; 3]) -> Result<Vec<[f32; 3]>, PathNotFound> {
        self.pathfinder.find_path(&self.query(), start, end)
    }

    /// Finds a path between two voxels.
    ///
    /// # Errors
    ///
    /// `PathNotFound` with the reason no path exists.
    pub fn find_voxel_path(
        &self,
        start: VoxelCoord,
        end: VoxelCoord,
    ) -> Result<Vec<VoxelCoord>, PathNotFound> {
        self.pathfinder.find_voxel_path(&self.query(), start, end)
    }

    /// Places a structure at `origin`, then re-meshes each touched chunk
    /// once. `AirForced` entries carve Air; unknown names place Air.
    pub fn import_structure(
        &mut self,
        document: &StructureDocument,
        origin: VoxelCoord,
    ) -> ImportReport {
        let placements = document.placements(origin);
        let mut report = ImportReport {
            malformed: document.len() - placements.len(),
            ..ImportReport::default()
        };

        let mut dirty = BTreeSet::new();
        for (voxel, name) in placements {
            let id = self.registry.id_from_name(name);
            if self.write_voxel(voxel, id, &mut dirty).is_some() {
                report.placed += 1;
            } else {
                report.unloaded += 1;
            }
        }

        report.remeshed_chunks = dirty.len();
        for chunk in dirty {
            self.scheduler.request_remesh(chunk);
        }

        if report.unloaded > 0 {
            warn!(
                unloaded = report.unloaded,
                "structure entries fell in chunks without data"
            );
        }
        info!(
            origin = %origin,
            placed = report.placed,
            malformed = report.malformed,
            "structure imported"
        );
        report
    }

    /// Exports every non-Air voxel in the inclusive box `min..=max`, with
    /// offsets relative to `origin`.
    #[must_use]
    pub fn export_structure(
        &self,
        origin: VoxelCoord,
        min: VoxelCoord,
        max: VoxelCoord,
    ) -> StructureDocument {
        let mut voxels = Vec::new();
        for z in min.z.min(max.z)..=min.z.max(max.z) {
            for y in min.y.min(max.y)..=min.y.max(max.y) {
                for x in min.x.min(max.x)..=min.x.max(max.x) {
                    let id = self.store.voxel(VoxelCoord::new(x, y, z));
                    if self.registry.is_air(id) {
                        continue;
                    }
                    voxels.push(StructureVoxel::new(
                        [x - origin.x, y - origin.y, z - origin.z],
                        self.registry.name_from_id(id),
                    ));
                }
            }
        }
        debug!(origin = %origin, voxels = voxels.len(), "structure exported");
        StructureDocument { voxels }
    }
}

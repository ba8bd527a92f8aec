//! # Chunk Lifecycle Scheduler
//!
//! Drives every chunk around the observer through its lifecycle:
//!
//! ```text
//! Unloaded ─► Queued ─► DataPending ─► DataReady ─► MeshPending ─► MeshReady ─► Displayed
//!    ▲                                                                              │
//!    └──────────────────────── outside load radius + 1 (from any state) ────────────┘
//! ```
//!
//! ## Mesh Dependencies
//!
//! A chunk may only mesh once it and all six face neighbors have voxel
//! data. Instead of polling, the scheduler keeps a dependency table:
//! chunk -> number of neighbors still without data. A chunk entering
//! `DataReady` records its own count and decrements the count of every
//! neighbor already in the table. Chunks waiting on neighbors (or outside
//! the mesh radius) sit in a pending-mesh set, re-checked when a neighbor
//! gets data or the observer moves. Neighbors above or below the loaded
//! layer range never load, so they do not count.
//!
//! ## Backpressure
//!
//! Each `tick` drains at most `results_per_tick` worker results, starts at
//! most `creation_per_tick` generations and `mesh_per_tick` meshes, and
//! applies at most `display_per_tick` meshes.
//!
//! ## Staleness
//!
//! Removing a chunk revokes its `LivenessToken`. A result whose token is
//! dead, or belongs to an earlier incarnation of the same coordinate, is
//! dropped without touching the store.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use bloxels_core::{BlockTypeId, ChunkCoord, ChunkMesh, ChunkStore, LivenessToken, MeshPool};

use crate::config::StreamingConfig;
use crate::executor::{Job, JobResult, TaskExecutor};

/// Lifecycle state of one chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChunkState {
    /// Not tracked.
    Unloaded,
    /// Waiting for a generation slot.
    Queued,
    /// Generation job in flight.
    DataPending,
    /// Voxels present; waiting for neighbors or a mesh slot.
    DataReady,
    /// Mesh job in flight.
    MeshPending,
    /// Mesh built, waiting for a display slot.
    MeshReady,
    /// Mesh applied to the chunk.
    Displayed,
}

impl ChunkState {
    /// Returns true once the chunk's voxels are filled.
    #[inline]
    #[must_use]
    pub fn has_data(self) -> bool {
        self >= Self::DataReady
    }
}

/// One lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Entered the load radius.
    Queued(ChunkCoord),
    /// Generation job submitted.
    GenerationStarted(ChunkCoord),
    /// Voxels written to the store.
    DataReady(ChunkCoord),
    /// Mesh job submitted.
    MeshStarted(ChunkCoord),
    /// Mesh job returned.
    MeshReady(ChunkCoord),
    /// Mesh applied to the chunk.
    Displayed(ChunkCoord),
    /// Left the load radius and was removed.
    Unloaded(ChunkCoord),
    /// A result arrived for a chunk that is gone.
    StaleDropped(ChunkCoord),
}

/// Scheduler counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Chunks currently tracked.
    pub tracked: usize,
    /// Chunks queued so far.
    pub queued: u64,
    /// Generation jobs submitted.
    pub generations_started: u64,
    /// Chunks that received data.
    pub data_ready: u64,
    /// Mesh jobs submitted.
    pub meshes_started: u64,
    /// Meshes applied.
    pub displayed: u64,
    /// Chunks unloaded.
    pub unloaded: u64,
    /// Results dropped for unloaded chunks.
    pub stale_dropped: u64,
    /// Chunks waiting in the pending-mesh set.
    pub pending_mesh: usize,
}

#[derive(Debug)]
struct ChunkEntry {
    state: ChunkState,
    liveness: Option<LivenessToken>,
    mesh_in_flight: bool,
    remesh_requested: bool,
}

impl ChunkEntry {
    const fn queued() -> Self {
        Self {
            state: ChunkState::Queued,
            liveness: None,
            mesh_in_flight: false,
            remesh_requested: false,
        }
    }

    fn owns(&self, token: &LivenessToken) -> bool {
        token.is_alive()
            && self
                .liveness
                .as_ref()
                .is_some_and(|own| own.same_instance(token))
    }
}

/// Streams chunks around an observer.
pub struct ChunkLifecycleScheduler<E: TaskExecutor> {
    store: Arc<ChunkStore>,
    pool: Arc<MeshPool>,
    executor: E,
    config: StreamingConfig,
    observer: Option<ChunkCoord>,
    entries: HashMap<ChunkCoord, ChunkEntry>,
    queue: VecDeque<ChunkCoord>,
    /// Neighbors still without data, for chunks that have data.
    missing_neighbors: HashMap<ChunkCoord, u8>,
    pending_mesh: HashSet<ChunkCoord>,
    mesh_queue: VecDeque<ChunkCoord>,
    display_queue: VecDeque<(ChunkCoord, ChunkMesh)>,
    results: Vec<JobResult>,
    events: Vec<SchedulerEvent>,
    stats: SchedulerStats,
}

impl<E: TaskExecutor> ChunkLifecycleScheduler<E> {
    /// Creates a scheduler with no observer.
    #[must_use]
    pub fn new(
        store: Arc<ChunkStore>,
        pool: Arc<MeshPool>,
        executor: E,
        config: StreamingConfig,
    ) -> Self {
        Self {
            store,
            pool,
            executor,
            config,
            observer: None,
            entries: HashMap::new(),
            queue: VecDeque::new(),
            missing_neighbors: HashMap::new(),
            pending_mesh: HashSet::new(),
            mesh_queue: VecDeque::new(),
            display_queue: VecDeque::new(),
            results: Vec::new(),
            events: Vec::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// The executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The executor, mutably (to drive a deferred executor in tests).
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Streaming settings.
    #[must_use]
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// The observer's chunk, once set.
    #[must_use]
    pub const fn observer(&self) -> Option<ChunkCoord> {
        self.observer
    }

    /// Current state of a coordinate.
    #[must_use]
    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        self.entries
            .get(&coord)
            .map_or(ChunkState::Unloaded, |entry| entry.state)
    }

    /// Neighbors `coord` is still waiting on, if it has data.
    #[must_use]
    pub fn missing_neighbors(&self, coord: ChunkCoord) -> Option<u8> {
        self.missing_neighbors.get(&coord).copied()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            tracked: self.entries.len(),
            pending_mesh: self.pending_mesh.len(),
            ..self.stats
        }
    }

    /// Tracked coordinates, sorted.
    #[must_use]
    pub fn tracked(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.entries.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Returns true when nothing is queued, in flight or awaiting display.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
            && self.mesh_queue.is_empty()
            && self.display_queue.is_empty()
            && self.executor.in_flight() == 0
    }

    fn in_load_range(&self, observer: ChunkCoord, coord: ChunkCoord) -> bool {
        observer.horizontal_distance(coord) <= self.config.load_radius
            && self.config.layer_in_range(coord.z)
    }

    fn outside_unload_range(&self, observer: ChunkCoord, coord: ChunkCoord) -> bool {
        observer.horizontal_distance(coord) > self.config.load_radius + 1
            || !self.config.layer_in_range(coord.z)
    }

    fn in_mesh_range(&self, coord: ChunkCoord) -> bool {
        self.observer
            .is_some_and(|observer| observer.horizontal_distance(coord) <= self.config.mesh_radius)
    }

    /// Moves the observer to a chunk: queues chunks entering the load
    /// radius, unloads chunks beyond radius + 1, and re-checks meshing
    /// eligibility.
    pub fn update_observer(&mut self, observer: ChunkCoord) {
        if self.observer == Some(observer) {
            return;
        }
        self.observer = Some(observer);

        let stale: Vec<ChunkCoord> = self
            .entries
            .keys()
            .copied()
            .filter(|&coord| self.outside_unload_range(observer, coord))
            .collect();
        for coord in stale {
            self.unload(coord);
        }

        let radius = self.config.load_radius;
        let mut entering = Vec::new();
        for z in self.config.min_chunk_z..=self.config.max_chunk_z {
            for y in observer.y - radius..=observer.y + radius {
                for x in observer.x - radius..=observer.x + radius {
                    let coord = ChunkCoord::new(x, y, z);
                    if self.in_load_range(observer, coord) && !self.entries.contains_key(&coord) {
                        entering.push(coord);
                    }
                }
            }
        }
        // nearest first, ties in coordinate order
        entering.sort_unstable_by_key(|&coord| (observer.horizontal_distance(coord), coord));

        for coord in entering {
            self.entries.insert(coord, ChunkEntry::queued());
            self.queue.push_back(coord);
            self.stats.queued += 1;
            self.events.push(SchedulerEvent::Queued(coord));
        }

        let waiting: Vec<ChunkCoord> = self.pending_mesh.iter().copied().collect();
        for coord in waiting {
            self.try_schedule_mesh(coord);
        }

        debug!(
            observer = %observer,
            tracked = self.entries.len(),
            queued = self.queue.len(),
            "observer moved"
        );
    }

    /// Asks for a chunk to be meshed again, e.g. after a voxel edit.
    ///
    /// Ignored for chunks without data. If a mesh job is in flight the
    /// request is deferred until it returns.
    pub fn request_remesh(&mut self, coord: ChunkCoord) {
        let Some(entry) = self.entries.get_mut(&coord) else {
            return;
        };
        if !entry.state.has_data() {
            return;
        }
        if entry.mesh_in_flight {
            entry.remesh_requested = true;
            return;
        }
        if self.mesh_queue.contains(&coord) {
            return;
        }
        self.pending_mesh.insert(coord);
        self.try_schedule_mesh(coord);
    }

    /// Runs one scheduling step and returns the events since the last call.
    pub fn tick(&mut self) -> Vec<SchedulerEvent> {
        self.drain_results();
        self.start_generations();
        self.start_meshes();
        self.apply_displays();
        std::mem::take(&mut self.events)
    }

    fn drain_results(&mut self) {
        let mut results = std::mem::take(&mut self.results);
        self.executor.drain(self.config.results_per_tick, &mut results);
        for result in results.drain(..) {
            match result {
                JobResult::Generated {
                    coord,
                    liveness,
                    voxels,
                } => self.on_generated(coord, &liveness, voxels.as_deref()),
                JobResult::Meshed {
                    coord,
                    liveness,
                    mesh,
                } => self.on_meshed(coord, &liveness, mesh),
            }
        }
        self.results = results;
    }

    fn drop_stale(&mut self, coord: ChunkCoord) {
        self.stats.stale_dropped += 1;
        self.events.push(SchedulerEvent::StaleDropped(coord));
        trace!(chunk = %coord, "stale result dropped");
    }

    fn on_generated(
        &mut self,
        coord: ChunkCoord,
        liveness: &LivenessToken,
        voxels: Option<&[BlockTypeId]>,
    ) {
        let live = self
            .entries
            .get(&coord)
            .is_some_and(|entry| entry.state == ChunkState::DataPending && entry.owns(liveness));
        let Some(voxels) = voxels.filter(|_| live) else {
            self.drop_stale(coord);
            return;
        };

        if let Err(error) = self.store.fill(coord, voxels) {
            warn!(chunk = %coord, %error, "generated data rejected");
            self.drop_stale(coord);
            return;
        }

        if let Some(entry) = self.entries.get_mut(&coord) {
            entry.state = ChunkState::DataReady;
        }
        self.stats.data_ready += 1;
        self.events.push(SchedulerEvent::DataReady(coord));

        let missing = coord
            .face_neighbors()
            .into_iter()
            .filter(|&neighbor| self.blocks_meshing(neighbor))
            .count();
        self.missing_neighbors
            .insert(coord, u8::try_from(missing).unwrap_or(u8::MAX));
        self.pending_mesh.insert(coord);

        for neighbor in coord.face_neighbors() {
            if let Some(count) = self.missing_neighbors.get_mut(&neighbor) {
                *count = count.saturating_sub(1);
            }
        }

        self.try_schedule_mesh(coord);
        for neighbor in coord.face_neighbors() {
            self.try_schedule_mesh(neighbor);
        }
    }

    /// True if `neighbor` is in the loaded layer range and has no data yet.
    fn blocks_meshing(&self, neighbor: ChunkCoord) -> bool {
        self.config.layer_in_range(neighbor.z) && !self.state(neighbor).has_data()
    }

    fn on_meshed(&mut self, coord: ChunkCoord, liveness: &LivenessToken, mesh: Option<ChunkMesh>) {
        let live = self
            .entries
            .get(&coord)
            .is_some_and(|entry| entry.mesh_in_flight && entry.owns(liveness));
        let mesh = match mesh {
            Some(mesh) if live => mesh,
            Some(mesh) => {
                self.pool.release(mesh);
                self.drop_stale(coord);
                return;
            }
            None => {
                self.drop_stale(coord);
                return;
            }
        };

        let mut remesh = false;
        if let Some(entry) = self.entries.get_mut(&coord) {
            entry.mesh_in_flight = false;
            entry.state = ChunkState::MeshReady;
            remesh = std::mem::take(&mut entry.remesh_requested);
        }
        self.events.push(SchedulerEvent::MeshReady(coord));
        self.display_queue.push_back((coord, mesh));

        if remesh {
            self.request_remesh(coord);
        }
    }

    fn try_schedule_mesh(&mut self, coord: ChunkCoord) {
        if !self.pending_mesh.contains(&coord)
            || self.missing_neighbors.get(&coord).copied().unwrap_or(u8::MAX) > 0
            || !self.in_mesh_range(coord)
        {
            return;
        }
        self.pending_mesh.remove(&coord);
        self.mesh_queue.push_back(coord);
    }

    fn start_generations(&mut self) {
        for _ in 0..self.config.creation_per_tick {
            let Some(coord) = self.queue.pop_front() else {
                break;
            };
            let liveness = match self.store.create(coord) {
                Ok(token) => token,
                Err(error) => {
                    // untracked again, so the next observer update re-queues it
                    self.entries.remove(&coord);
                    warn!(chunk = %coord, %error, "chunk creation failed");
                    continue;
                }
            };
            if let Some(entry) = self.entries.get_mut(&coord) {
                entry.state = ChunkState::DataPending;
                entry.liveness = Some(liveness.clone());
            }
            self.executor.submit(Job::Generate { coord, liveness });
            self.stats.generations_started += 1;
            self.events.push(SchedulerEvent::GenerationStarted(coord));
        }
    }

    fn start_meshes(&mut self) {
        let mut started = 0;
        while started < self.config.mesh_per_tick {
            let Some(coord) = self.mesh_queue.pop_front() else {
                break;
            };
            // neighbors may have unloaded or the observer moved since queueing
            if self.missing_neighbors.get(&coord).copied().unwrap_or(u8::MAX) > 0
                || !self.in_mesh_range(coord)
            {
                if self.entries.contains_key(&coord) {
                    self.pending_mesh.insert(coord);
                }
                continue;
            }
            let Some(liveness) = self.entries.get(&coord).and_then(|e| e.liveness.clone()) else {
                continue;
            };
            let Some(neighborhood) = self.store.neighborhood(coord) else {
                continue;
            };
            if let Some(entry) = self.entries.get_mut(&coord) {
                entry.state = ChunkState::MeshPending;
                entry.mesh_in_flight = true;
            }
            self.executor.submit(Job::Mesh {
                coord,
                neighborhood,
                liveness,
            });
            self.stats.meshes_started += 1;
            self.events.push(SchedulerEvent::MeshStarted(coord));
            started += 1;
        }
    }

    fn apply_displays(&mut self) {
        for _ in 0..self.config.display_per_tick {
            let Some((coord, mesh)) = self.display_queue.pop_front() else {
                break;
            };
            let Some(old) = self
                .store
                .with_chunk_mut(coord, |chunk| chunk.apply_mesh(mesh))
            else {
                continue;
            };
            self.pool.release(old);

            if let Some(entry) = self.entries.get_mut(&coord) {
                if !entry.mesh_in_flight {
                    entry.state = ChunkState::Displayed;
                }
            }
            self.stats.displayed += 1;
            self.events.push(SchedulerEvent::Displayed(coord));
        }
    }

    /// Removes a chunk from every queue and the store.
    fn unload(&mut self, coord: ChunkCoord) {
        let Some(entry) = self.entries.remove(&coord) else {
            return;
        };

        self.queue.retain(|&queued| queued != coord);
        self.mesh_queue.retain(|&queued| queued != coord);
        self.pending_mesh.remove(&coord);
        self.missing_neighbors.remove(&coord);

        let pool = &self.pool;
        self.display_queue.retain_mut(|(queued, mesh)| {
            if *queued == coord {
                pool.release(std::mem::take(mesh));
                false
            } else {
                true
            }
        });

        if let Some(mut chunk) = self.store.remove(coord) {
            self.pool.release(chunk.take_mesh());
        }

        if entry.state.has_data() {
            for neighbor in coord.face_neighbors() {
                if let Some(count) = self.missing_neighbors.get_mut(&neighbor) {
                    *count += 1;
                    if self.mesh_queue.contains(&neighbor) {
                        self.mesh_queue.retain(|&queued| queued != neighbor);
                        self.pending_mesh.insert(neighbor);
                    }
                }
            }
        }

        self.stats.unloaded += 1;
        self.events.push(SchedulerEvent::Unloaded(coord));
        trace!(chunk = %coord, "chunk unloaded");
    }
}

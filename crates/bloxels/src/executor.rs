//! # Task Executors
//!
//! The scheduler hands chunk generation and meshing to a `TaskExecutor`
//! and later drains the results. The executor decides where the work runs:
//!
//! | Executor          | Runs jobs                          | Used by            |
//! |-------------------|------------------------------------|--------------------|
//! | `WorkerPool`      | on background threads              | the running world  |
//! | `InlineExecutor`  | immediately, inside `submit`       | tools, simple tests |
//! | `DeferredExecutor`| when the caller says so            | ordering tests     |
//!
//! Every job carries its chunk's `LivenessToken`, and every result carries
//! it back, so the scheduler can drop results for chunks unloaded while
//! the job was running.

use std::collections::VecDeque;
use std::sync::Arc;

use bloxels_core::{
    BlockTypeId, ChunkCoord, ChunkMesh, ChunkNeighborhood, LivenessToken, MeshPool, VoxelRegistry,
};
use bloxels_meshing::GreedyMesher;
use bloxels_procedural::ChunkGenerator;

/// Work sent to an executor.
#[derive(Clone, Debug)]
pub enum Job {
    /// Fill a chunk's voxels.
    Generate {
        /// Target chunk.
        coord: ChunkCoord,
        /// Revoked when the chunk unloads.
        liveness: LivenessToken,
    },
    /// Mesh a chunk from a snapshot of it and its neighbors.
    Mesh {
        /// Target chunk.
        coord: ChunkCoord,
        /// Voxel snapshot.
        neighborhood: ChunkNeighborhood,
        /// Revoked when the chunk unloads.
        liveness: LivenessToken,
    },
}

impl Job {
    /// The chunk this job targets.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        match self {
            Self::Generate { coord, .. } | Self::Mesh { coord, .. } => *coord,
        }
    }

    /// Returns true for mesh jobs.
    #[must_use]
    pub const fn is_mesh(&self) -> bool {
        matches!(self, Self::Mesh { .. })
    }
}

/// A finished job. `None` payloads mean the job was abandoned because its
/// chunk unloaded mid-run.
#[derive(Debug)]
pub enum JobResult {
    /// Generation output.
    Generated {
        /// Target chunk.
        coord: ChunkCoord,
        /// Token the job was started with.
        liveness: LivenessToken,
        /// Voxel buffer, `chunk_size³` long.
        voxels: Option<Vec<BlockTypeId>>,
    },
    /// Meshing output.
    Meshed {
        /// Target chunk.
        coord: ChunkCoord,
        /// Token the job was started with.
        liveness: LivenessToken,
        /// The new mesh.
        mesh: Option<ChunkMesh>,
    },
}

impl JobResult {
    /// The chunk this result belongs to.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        match self {
            Self::Generated { coord, .. } | Self::Meshed { coord, .. } => *coord,
        }
    }
}

/// Everything a job needs to run. Cheap to clone into each worker.
#[derive(Clone)]
pub struct JobContext {
    generator: ChunkGenerator,
    registry: Arc<VoxelRegistry>,
    pool: Arc<MeshPool>,
}

impl JobContext {
    /// Creates a context.
    #[must_use]
    pub fn new(generator: ChunkGenerator, registry: Arc<VoxelRegistry>, pool: Arc<MeshPool>) -> Self {
        Self {
            generator,
            registry,
            pool,
        }
    }

    /// Runs one job to completion on the calling thread.
    pub fn run(&self, job: Job, mesher: &mut GreedyMesher) -> JobResult {
        match job {
            Job::Generate { coord, liveness } => {
                let voxels = self.generator.generate(coord, &liveness);
                JobResult::Generated {
                    coord,
                    liveness,
                    voxels,
                }
            }
            Job::Mesh {
                coord,
                neighborhood,
                liveness,
            } => {
                let mut mesh = self.pool.acquire();
                let voxel_size = self.generator.geometry().voxel_size();
                let mesh = match mesher.mesh_into(
                    &neighborhood,
                    &self.registry,
                    voxel_size,
                    &liveness,
                    &mut mesh,
                ) {
                    Some(_) => Some(mesh),
                    None => {
                        self.pool.release(mesh);
                        None
                    }
                };
                JobResult::Meshed {
                    coord,
                    liveness,
                    mesh,
                }
            }
        }
    }
}

/// Where the scheduler's jobs run.
pub trait TaskExecutor {
    /// Starts a job. Never blocks on the job itself.
    fn submit(&mut self, job: Job);

    /// Moves up to `max` finished results into `out`. Never blocks.
    fn drain(&mut self, max: usize, out: &mut Vec<JobResult>);

    /// Jobs submitted whose results have not been drained yet.
    fn in_flight(&self) -> usize;
}

/// Runs each job inside `submit`.
pub struct InlineExecutor {
    context: JobContext,
    mesher: GreedyMesher,
    completed: VecDeque<JobResult>,
}

impl InlineExecutor {
    /// Creates an inline executor.
    #[must_use]
    pub fn new(context: JobContext) -> Self {
        Self {
            context,
            mesher: GreedyMesher::new(),
            completed: VecDeque::new(),
        }
    }
}

impl TaskExecutor for InlineExecutor {
    fn submit(&mut self, job: Job) {
        let result = self.context.run(job, &mut self.mesher);
        self.completed.push_back(result);
    }

    fn drain(&mut self, max: usize, out: &mut Vec<JobResult>) {
        let count = max.min(self.completed.len());
        out.extend(self.completed.drain(..count));
    }

    fn in_flight(&self) -> usize {
        self.completed.len()
    }
}

/// Holds jobs until the caller runs them, so tests can finish work in any
/// order.
pub struct DeferredExecutor {
    context: JobContext,
    mesher: GreedyMesher,
    pending: VecDeque<Job>,
    completed: VecDeque<JobResult>,
    submitted: Vec<(ChunkCoord, bool)>,
}

impl DeferredExecutor {
    /// Creates a deferred executor.
    #[must_use]
    pub fn new(context: JobContext) -> Self {
        Self {
            context,
            mesher: GreedyMesher::new(),
            pending: VecDeque::new(),
            completed: VecDeque::new(),
            submitted: Vec::new(),
        }
    }

    /// Jobs not yet run, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Job> {
        self.pending.iter()
    }

    /// Every job ever submitted, as `(coord, is_mesh)`, in order.
    #[must_use]
    pub fn submitted(&self) -> &[(ChunkCoord, bool)] {
        &self.submitted
    }

    /// Runs the first pending job matching `predicate`. Returns false if
    /// none matched.
    pub fn run_first<P>(&mut self, predicate: P) -> bool
    where
        P: Fn(&Job) -> bool,
    {
        let Some(position) = self.pending.iter().position(predicate) else {
            return false;
        };
        let Some(job) = self.pending.remove(position) else {
            return false;
        };
        let result = self.context.run(job, &mut self.mesher);
        self.completed.push_back(result);
        true
    }

    /// Runs every pending job matching `predicate` and returns how many ran.
    pub fn run_matching<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&Job) -> bool,
    {
        let mut ran = 0;
        while self.run_first(&predicate) {
            ran += 1;
        }
        ran
    }

    /// Runs every pending job.
    pub fn run_all(&mut self) -> usize {
        self.run_matching(|_| true)
    }
}

impl TaskExecutor for DeferredExecutor {
    fn submit(&mut self, job: Job) {
        self.submitted.push((job.coord(), job.is_mesh()));
        self.pending.push_back(job);
    }

    fn drain(&mut self, max: usize, out: &mut Vec<JobResult>) {
        let count = max.min(self.completed.len());
        out.extend(self.completed.drain(..count));
    }

    fn in_flight(&self) -> usize {
        self.pending.len() + self.completed.len()
    }
}

//! # Worker Pool
//!
//! Background threads for chunk generation and meshing.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler ──submit──► [job channel] ──► worker 0..N ──► [result channel] ──drain──► Scheduler
//!                                         (own GreedyMesher)
//! ```
//!
//! Workers never touch the chunk store. A job carries everything it reads
//! (a generator handle or a voxel snapshot) and the result goes back over a
//! channel for the coordination thread to apply.
//!
//! Shutdown: `Drop` raises the shutdown flag, disconnects the job channel
//! and joins every thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace};

use bloxels_meshing::GreedyMesher;

use crate::executor::{Job, JobContext, JobResult, TaskExecutor};

/// How long an idle worker waits before rechecking the shutdown flag.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Worker counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Generation jobs finished.
    pub generated: u64,
    /// Mesh jobs finished.
    pub meshed: u64,
    /// Jobs that stopped early because their chunk unloaded.
    pub abandoned: u64,
}

/// Threaded `TaskExecutor`.
pub struct WorkerPool {
    job_tx: Option<Sender<Job>>,
    result_rx: Receiver<JobResult>,
    handles: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<Mutex<WorkerStats>>,
    in_flight: usize,
}

impl WorkerPool {
    /// Spawns `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns the OS error if a thread cannot be spawned; threads already
    /// started are shut down.
    pub fn new(context: JobContext, threads: usize) -> std::io::Result<Self> {
        let (job_tx, job_rx) = unbounded::<Job>();
        let (result_tx, result_rx) = unbounded::<JobResult>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(WorkerStats::default()));

        let mut pool = Self {
            job_tx: Some(job_tx),
            result_rx,
            handles: Vec::with_capacity(threads.max(1)),
            shutdown,
            stats,
            in_flight: 0,
        };

        for index in 0..threads.max(1) {
            let worker_context = context.clone();
            let worker_jobs = job_rx.clone();
            let worker_results = result_tx.clone();
            let worker_shutdown = Arc::clone(&pool.shutdown);
            let worker_stats = Arc::clone(&pool.stats);

            let handle = thread::Builder::new()
                .name(format!("bloxels-worker-{index}"))
                .spawn(move || {
                    Self::worker_loop(
                        &worker_context,
                        &worker_jobs,
                        &worker_results,
                        &worker_shutdown,
                        &worker_stats,
                    );
                })?;
            pool.handles.push(handle);
        }

        debug!(threads = pool.handles.len(), "worker pool started");
        Ok(pool)
    }

    /// Worker thread main loop.
    fn worker_loop(
        context: &JobContext,
        jobs: &Receiver<Job>,
        results: &Sender<JobResult>,
        shutdown: &AtomicBool,
        stats: &Mutex<WorkerStats>,
    ) {
        let mut mesher = GreedyMesher::new();

        while !shutdown.load(Ordering::Relaxed) {
            let job = match jobs.recv_timeout(IDLE_POLL) {
                Ok(job) => job,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let coord = job.coord();
            let result = context.run(job, &mut mesher);
            {
                let mut s = stats.lock();
                match &result {
                    JobResult::Generated { voxels: None, .. }
                    | JobResult::Meshed { mesh: None, .. } => s.abandoned += 1,
                    JobResult::Generated { .. } => s.generated += 1,
                    JobResult::Meshed { .. } => s.meshed += 1,
                }
            }
            trace!(chunk = %coord, "job finished");

            if results.send(result).is_err() {
                // Pool dropped; nobody is listening.
                break;
            }
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.handles.len()
    }

    /// Snapshot of the worker counters.
    #[must_use]
    pub fn stats(&self) -> WorkerStats {
        *self.stats.lock()
    }
}

impl TaskExecutor for WorkerPool {
    fn submit(&mut self, job: Job) {
        let Some(job_tx) = &self.job_tx else {
            return;
        };
        if job_tx.send(job).is_ok() {
            self.in_flight += 1;
        }
    }

    fn drain(&mut self, max: usize, out: &mut Vec<JobResult>) {
        for result in self.result_rx.try_iter().take(max) {
            self.in_flight = self.in_flight.saturating_sub(1);
            out.push(result);
        }
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Disconnecting wakes idle workers immediately
        self.job_tx.take();

        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        debug!("worker pool stopped");
    }
}

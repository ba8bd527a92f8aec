//! Headless world simulation.
//!
//! Walks an observer across a generated world, streaming chunks in and out
//! around it, then runs a path query along the surface.
//!
//! ```text
//! bloxels_sim --ticks 300 --speed 400 --seed 7
//! RUST_LOG=bloxels=debug bloxels_sim --config crates/bloxels/worlds/lowlands.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bloxels::{TaskExecutor, VoxelWorld, WorldConfig, WorldResult};
use bloxels_core::VoxelCoord;

/// Ticks allowed for the world to settle after the walk.
const SETTLE_TICKS: u32 = 5_000;

/// Headless voxel world simulation.
#[derive(Parser, Debug)]
#[command(name = "bloxels_sim")]
#[command(about = "Streams a voxel world around a moving observer")]
struct Args {
    /// World config TOML (defaults are used if omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticks to walk for.
    #[arg(short, long, default_value_t = 200)]
    ticks: u32,

    /// Observer speed in world units per tick, along +x.
    #[arg(short, long, default_value_t = 200.0)]
    speed: f32,

    /// Sleep between ticks, in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Worker threads (overrides the config).
    #[arg(long)]
    threads: Option<usize>,

    /// World seed (overrides the config).
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation aborted");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> WorldResult<WorldConfig> {
    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(threads) = args.threads {
        config.streaming.worker_threads = threads;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> WorldResult<()> {
    let config = load_config(args)?;
    let mut world = VoxelWorld::new(config)?;
    let pause = Duration::from_millis(args.tick_ms);
    let started = Instant::now();

    let mut position = [0.0_f32, 0.0, 0.0];
    for tick in 0..args.ticks {
        world.set_observer_position(position);
        world.tick();
        if tick % 50 == 0 {
            let stats = world.stats();
            info!(
                tick,
                x = position[0],
                tracked = stats.tracked,
                displayed = stats.displayed,
                unloaded = stats.unloaded,
                stale = stats.stale_dropped,
                "walking"
            );
        }
        position[0] += args.speed;
        thread::sleep(pause);
    }

    let mut settle = 0;
    while !world.is_idle() && settle < SETTLE_TICKS {
        world.tick();
        settle += 1;
        thread::sleep(Duration::from_millis(1));
    }
    if !world.is_idle() {
        warn!(in_flight = world.scheduler().executor().in_flight(), "world did not settle");
    }

    let stats = world.stats();
    let workers = world.scheduler().executor().stats();
    let pool = world.mesh_pool().stats();
    info!(
        elapsed_ms = started.elapsed().as_millis(),
        tracked = stats.tracked,
        generated = workers.generated,
        meshed = workers.meshed,
        abandoned = workers.abandoned,
        displayed = stats.displayed,
        unloaded = stats.unloaded,
        stale = stats.stale_dropped,
        meshes_created = pool.created,
        meshes_reused = pool.reused,
        "walk finished"
    );

    surface_path(&world);
    Ok(())
}

/// Paths 16 voxels along +x on the terrain surface at the observer.
fn surface_path(world: &VoxelWorld) {
    let geometry = world.geometry();
    let observer = world.scheduler().observer().unwrap_or_default();
    let origin = geometry.chunk_origin_voxel(observer);
    let on_surface = |x: i32, y: i32| VoxelCoord::new(x, y, world.surface_height(x, y) + 1);

    let start = on_surface(origin.x, origin.y);
    let goal = on_surface(origin.x + 16, origin.y);
    match world.find_voxel_path(start, goal) {
        Ok(path) => info!(%start, %goal, waypoints = path.len(), "surface path found"),
        Err(reason) => warn!(%start, %goal, %reason, "no surface path"),
    }
}

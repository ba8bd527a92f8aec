//! # Chunk Lifecycle Tests
//!
//! Drives the scheduler with a deferred executor so jobs finish in an
//! order the test picks, then checks the ordering rules:
//! no mesh before neighbor data, unloads beyond radius + 1, stale
//! results dropped, and per-tick caps respected.

use bloxels::{
    ChunkState, DeferredExecutor, Job, SchedulerEvent, TaskExecutor, TerrainConfig, VoxelWorld,
    WorldConfig,
};
use bloxels_core::ChunkCoord;
use bloxels_procedural::Biome;

fn flat_config(load_radius: i32, mesh_radius: i32) -> WorldConfig {
    let mut config = WorldConfig::default();
    config.voxel.chunk_size = 8;
    config.streaming.load_radius = load_radius;
    config.streaming.mesh_radius = mesh_radius;
    config.streaming.min_chunk_z = 0;
    config.streaming.max_chunk_z = 1;
    config.streaming.creation_per_tick = 1_000;
    config.streaming.mesh_per_tick = 1_000;
    config.streaming.display_per_tick = 1_000;
    config.streaming.results_per_tick = 1_000;
    config.terrain = TerrainConfig::Flat {
        biome: Biome::Plains,
        height: 12,
    };
    config
}

fn deferred_world(config: WorldConfig) -> VoxelWorld<DeferredExecutor> {
    VoxelWorld::build(config, |context| Ok(DeferredExecutor::new(context))).unwrap()
}

/// Runs every job and ticks until nothing is left.
fn settle(world: &mut VoxelWorld<DeferredExecutor>) -> Vec<SchedulerEvent> {
    let mut events = Vec::new();
    for _ in 0..100 {
        world.scheduler_mut().executor_mut().run_all();
        events.extend(world.tick());
        if world.is_idle() {
            return events;
        }
    }
    panic!("world did not settle");
}

fn pending_generation(executor: &DeferredExecutor) -> Option<ChunkCoord> {
    executor
        .pending()
        .filter(|job| !job.is_mesh())
        .last()
        .map(Job::coord)
}

/// Test: no mesh job starts while any in-layer face neighbor lacks data,
/// whatever order the generations finish in.
#[test]
fn test_no_mesh_before_neighbors_have_data() {
    let mut world = deferred_world(flat_config(2, 1));
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));
    world.tick();
    assert_eq!(world.stats().generations_started, 5 * 5 * 2);

    let mut checked = 0;
    // newest generation first, the reverse of submission order
    while let Some(coord) = pending_generation(world.scheduler().executor()) {
        let executor = world.scheduler_mut().executor_mut();
        assert!(executor.run_first(|job| !job.is_mesh() && job.coord() == coord));
        world.tick();

        let submitted = world.scheduler().executor().submitted().to_vec();
        for &(chunk, is_mesh) in &submitted[checked..] {
            if !is_mesh {
                continue;
            }
            assert!(world.store().has_data(chunk));
            for neighbor in chunk.face_neighbors() {
                if (0..=1).contains(&neighbor.z) {
                    assert!(
                        world.store().has_data(neighbor),
                        "{chunk} meshed before neighbor {neighbor} had data"
                    );
                }
            }
        }
        checked = submitted.len();
    }

    settle(&mut world);

    assert_eq!(world.chunk_state(ChunkCoord::new(0, 0, 0)), ChunkState::Displayed);
    assert_eq!(world.chunk_state(ChunkCoord::new(1, 1, 1)), ChunkState::Displayed);
    assert_eq!(world.chunk_state(ChunkCoord::new(2, 0, 0)), ChunkState::DataReady);
    let meshed: Vec<ChunkCoord> = world
        .scheduler()
        .executor()
        .submitted()
        .iter()
        .filter(|(_, is_mesh)| *is_mesh)
        .map(|(chunk, _)| *chunk)
        .collect();
    assert_eq!(meshed.len(), 3 * 3 * 2);
}

/// Test: a chunk missing one neighbor waits in `DataReady` and meshes as
/// soon as that neighbor's data lands.
#[test]
fn test_mesh_waits_for_last_neighbor() {
    let mut world = deferred_world(flat_config(2, 1));
    let center = ChunkCoord::new(0, 0, 0);
    let east = ChunkCoord::new(1, 0, 0);
    world.set_observer_chunk(center);
    world.tick();

    let executor = world.scheduler_mut().executor_mut();
    executor.run_matching(|job| job.coord() != east);
    world.tick();

    assert_eq!(world.chunk_state(center), ChunkState::DataReady);
    assert_eq!(world.scheduler().missing_neighbors(center), Some(1));
    assert!(!world
        .scheduler()
        .executor()
        .submitted()
        .contains(&(center, true)));

    world
        .scheduler_mut()
        .executor_mut()
        .run_first(|job| job.coord() == east);
    let events = world.tick();

    assert!(events.contains(&SchedulerEvent::DataReady(east)));
    assert!(events.contains(&SchedulerEvent::MeshStarted(center)));
    assert_eq!(world.chunk_state(center), ChunkState::MeshPending);
}

/// Test: moving the observer unloads chunks beyond load radius + 1 and
/// keeps the ones on the hysteresis ring.
#[test]
fn test_unload_beyond_radius_plus_one() {
    let mut world = deferred_world(flat_config(1, 0));
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));
    settle(&mut world);
    assert_eq!(world.store().len(), 3 * 3 * 2);

    world.set_observer_chunk(ChunkCoord::new(3, 0, 0));
    let events = world.tick();

    for x in -1..=0 {
        let gone = ChunkCoord::new(x, 0, 1);
        assert!(events.contains(&SchedulerEvent::Unloaded(gone)));
        assert_eq!(world.chunk_state(gone), ChunkState::Unloaded);
        assert!(!world.store().contains(gone));
    }
    let ring = ChunkCoord::new(1, 0, 1);
    assert_eq!(world.chunk_state(ring), ChunkState::DataReady);
    assert!(world.store().contains(ring));
    assert_eq!(world.stats().unloaded, 2 * 3 * 2);
    assert!(events.contains(&SchedulerEvent::Queued(ChunkCoord::new(3, 0, 0))));
}

/// Test: results for chunks unloaded while their job ran are dropped,
/// including when the coordinate has been re-created since.
#[test]
fn test_stale_results_dropped() {
    let mut world = deferred_world(flat_config(1, 0));
    let origin = ChunkCoord::new(0, 0, 0);
    world.set_observer_chunk(origin);
    world.tick();
    assert_eq!(world.stats().generations_started, 18);

    // away and back before any job finishes
    world.set_observer_chunk(ChunkCoord::new(10, 0, 0));
    world.set_observer_chunk(origin);
    world.tick();
    assert_eq!(world.stats().generations_started, 36);

    let executor = world.scheduler_mut().executor_mut();
    for _ in 0..18 {
        assert!(executor.run_first(|_| true));
    }
    let events = world.tick();

    let stale = events
        .iter()
        .filter(|event| matches!(event, SchedulerEvent::StaleDropped(_)))
        .count();
    assert_eq!(stale, 18);
    assert_eq!(world.stats().stale_dropped, 18);
    assert_eq!(world.chunk_state(origin), ChunkState::DataPending);
    assert!(!world.store().has_data(origin));

    settle(&mut world);
    assert_eq!(world.chunk_state(origin), ChunkState::Displayed);
    assert_eq!(world.stats().stale_dropped, 18);
}

/// Test: generations start nearest first and never exceed the per-tick cap.
#[test]
fn test_creation_cap_nearest_first() {
    let mut config = flat_config(2, 1);
    config.streaming.creation_per_tick = 3;
    let mut world = deferred_world(config);
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));

    let started: Vec<ChunkCoord> = world
        .tick()
        .into_iter()
        .filter_map(|event| match event {
            SchedulerEvent::GenerationStarted(chunk) => Some(chunk),
            _ => None,
        })
        .collect();

    assert_eq!(
        started,
        vec![
            ChunkCoord::new(0, 0, 0),
            ChunkCoord::new(0, 0, 1),
            ChunkCoord::new(-1, -1, 0),
        ]
    );
    assert_eq!(world.scheduler().executor().in_flight(), 3);
    assert_eq!(world.chunk_state(ChunkCoord::new(2, 2, 1)), ChunkState::Queued);
}

/// Test: at most `display_per_tick` meshes are applied per tick.
#[test]
fn test_display_cap() {
    let mut config = flat_config(2, 1);
    config.streaming.display_per_tick = 2;
    let mut world = deferred_world(config);
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));

    let mut displayed_total = 0;
    for _ in 0..100 {
        world.scheduler_mut().executor_mut().run_all();
        let displayed = world
            .tick()
            .iter()
            .filter(|event| matches!(event, SchedulerEvent::Displayed(_)))
            .count();
        assert!(displayed <= 2);
        displayed_total += displayed;
        if world.is_idle() {
            break;
        }
    }

    assert_eq!(displayed_total, 3 * 3 * 2);
}

/// Test: meshing outside the mesh radius waits until the observer comes
/// closer.
#[test]
fn test_observer_move_releases_pending_meshes() {
    let mut world = deferred_world(flat_config(3, 1));
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));
    settle(&mut world);
    let far = ChunkCoord::new(2, 0, 0);
    assert_eq!(world.chunk_state(far), ChunkState::DataReady);

    world.set_observer_chunk(ChunkCoord::new(1, 0, 0));
    let events = world.tick();

    assert!(events.contains(&SchedulerEvent::MeshStarted(far)));
}

/// Test: meshes already queued when the observer jumps are re-checked
/// before they start, so none runs beside an unloaded neighbor or outside
/// the mesh radius.
#[test]
fn test_queued_meshes_rechecked_after_observer_jump() {
    let mut config = flat_config(2, 1);
    config.streaming.max_chunk_z = 0;
    config.streaming.mesh_per_tick = 1;
    let mut world = deferred_world(config);
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));
    world.tick();
    world.scheduler_mut().executor_mut().run_all();
    let events = world.tick();
    let started = events
        .iter()
        .filter(|event| matches!(event, SchedulerEvent::MeshStarted(_)))
        .count();
    // the cap leaves the rest of the ring waiting
    assert_eq!(started, 1);

    let target = ChunkCoord::new(4, 0, 0);
    world.set_observer_chunk(target);
    let mut checked = world.scheduler().executor().submitted().len();
    for _ in 0..40 {
        world.scheduler_mut().executor_mut().run_all();
        world.tick();

        let submitted = world.scheduler().executor().submitted().to_vec();
        for &(chunk, is_mesh) in &submitted[checked..] {
            if !is_mesh {
                continue;
            }
            assert!(
                target.horizontal_distance(chunk) <= 1,
                "{chunk} meshed outside the mesh radius"
            );
            for neighbor in chunk.face_neighbors() {
                if neighbor.z == 0 {
                    assert!(
                        world.store().has_data(neighbor),
                        "{chunk} meshed before neighbor {neighbor} had data"
                    );
                }
            }
        }
        checked = submitted.len();
        if world.is_idle() {
            break;
        }
    }

    assert!(world.is_idle());
    assert_eq!(world.chunk_state(target), ChunkState::Displayed);
    assert_eq!(world.chunk_state(ChunkCoord::new(5, 1, 0)), ChunkState::Displayed);
    assert_eq!(world.chunk_state(ChunkCoord::new(0, 0, 0)), ChunkState::Unloaded);
    assert_eq!(world.scheduler().missing_neighbors(ChunkCoord::new(1, 0, 0)), Some(1));
}

/// Test: a chunk whose creation fails is dropped back to `Unloaded` and
/// queued again on a later observer move.
#[test]
fn test_failed_creation_rolls_back() {
    let mut world = deferred_world(flat_config(1, 0));
    let blocked = ChunkCoord::new(1, 0, 0);
    // a chunk the scheduler does not own already sits at that coordinate
    world.store().create(blocked).unwrap();
    world.set_observer_chunk(ChunkCoord::new(0, 0, 0));

    let events = world.tick();

    assert!(!events.contains(&SchedulerEvent::GenerationStarted(blocked)));
    assert_eq!(world.chunk_state(blocked), ChunkState::Unloaded);
    assert_eq!(world.stats().generations_started, 3 * 3 * 2 - 1);

    world.store().remove(blocked);
    world.set_observer_chunk(blocked);
    let events = world.tick();

    assert!(events.contains(&SchedulerEvent::GenerationStarted(blocked)));
    assert_eq!(world.chunk_state(blocked), ChunkState::DataPending);
}

//! Benchmark for voxel A*.
//!
//! Run with: cargo bench --package bloxels_pathfinding --bench pathfinding_benchmark

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use bloxels_core::VoxelCoord;
use bloxels_pathfinding::{PathCosts, VoxelPathfinder, VoxelQuery};

struct Grid {
    solid: HashSet<VoxelCoord>,
}

impl VoxelQuery for Grid {
    fn is_air(&self, voxel: VoxelCoord) -> bool {
        !self.solid.contains(&voxel)
    }

    fn is_solid(&self, voxel: VoxelCoord) -> bool {
        self.solid.contains(&voxel)
    }
}

/// 64x64 platform with random pillars and single steps.
fn scattered_grid() -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut solid = HashSet::new();
    for y in 0..64 {
        for x in 0..64 {
            solid.insert(VoxelCoord::new(x, y, 0));
        }
    }
    for _ in 0..400 {
        let (x, y) = (rng.gen_range(2..62), rng.gen_range(2..62));
        solid.insert(VoxelCoord::new(x, y, 1));
        if rng.gen_bool(0.5) {
            solid.insert(VoxelCoord::new(x, y, 2));
        }
    }
    Grid { solid }
}

fn benchmark_paths(c: &mut Criterion) {
    let grid = scattered_grid();
    let finder = VoxelPathfinder::new(PathCosts::default(), 100.0);

    c.bench_function("astar_64x64_corner_to_corner", |b| {
        b.iter(|| {
            black_box(finder.find_voxel_path(
                &grid,
                VoxelCoord::new(0, 0, 1),
                VoxelCoord::new(63, 63, 1),
            ))
        });
    });

    c.bench_function("astar_64x64_short_hop", |b| {
        b.iter(|| {
            black_box(finder.find_voxel_path(
                &grid,
                VoxelCoord::new(0, 0, 1),
                VoxelCoord::new(1, 10, 1),
            ))
        });
    });
}

criterion_group!(benches, benchmark_paths);
criterion_main!(benches);

//! Benchmark for chunk data generation.
//!
//! Run with: cargo bench --package bloxels_procedural --bench generation_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use bloxels_core::{ChunkCoord, LivenessToken, VoxelConfig, VoxelRegistry};
use bloxels_procedural::{
    Biome, BiomeDefinition, BiomeTable, ChunkGenerator, FlatTerrain, NoiseTerrain,
    NoiseTerrainConfig, TerrainFn, WorldSeed,
};

fn generator(terrain: Arc<dyn TerrainFn>, registry: &VoxelRegistry) -> ChunkGenerator {
    let biomes = BiomeTable::resolve(&BiomeDefinition::defaults(), registry).unwrap();
    ChunkGenerator::new(VoxelConfig::default().geometry(), terrain, Arc::new(biomes), registry)
        .unwrap()
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let registry = VoxelRegistry::with_defaults();
    let flat = generator(Arc::new(FlatTerrain::new(Biome::Plains, 10)), &registry);
    let token = LivenessToken::new();

    c.bench_function("flat_chunk_generation", |b| {
        let mut x = 0i32;
        b.iter(|| {
            x = x.wrapping_add(1);
            black_box(flat.generate(ChunkCoord::new(x, 0, 0), &token))
        });
    });
}

fn benchmark_noise_grid(c: &mut Criterion) {
    let registry = VoxelRegistry::with_defaults();
    let biomes = Arc::new(BiomeTable::resolve(&BiomeDefinition::defaults(), &registry).unwrap());
    let terrain = NoiseTerrain::new(&NoiseTerrainConfig::default(), WorldSeed::new(42), biomes);
    let noise = generator(Arc::new(terrain), &registry);
    let token = LivenessToken::new();

    let mut group = c.benchmark_group("noise_generation");

    // 8x8 columns of 4 vertical layers
    group.throughput(Throughput::Elements(8 * 8 * 4));
    group.bench_function("8x8x4_chunks", |b| {
        b.iter(|| {
            for y in 0..8 {
                for x in 0..8 {
                    for z in 0..4 {
                        black_box(noise.generate(ChunkCoord::new(x, y, z), &token));
                    }
                }
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_single_chunk, benchmark_noise_grid);
criterion_main!(benches);

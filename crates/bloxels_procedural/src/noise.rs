//! # Simplex Noise
//!
//! Seeded 2D simplex noise and fractal layers built on it.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, every sample is bit-identical on any
//! platform: the permutation table comes from a xorshift shuffle and the
//! math uses only `f64` add/multiply.

use serde::{Deserialize, Serialize};

/// World seed for deterministic generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives an independent sub-seed for one noise layer.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0 ^ purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xB10C_5EED)
    }
}

/// Gradient directions for 2D simplex corners.
const GRADIENTS: [[f64; 2]; 8] = [
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [-1.0, 1.0],
    [-1.0, 0.0],
    [-1.0, -1.0],
    [0.0, -1.0],
    [1.0, -1.0],
];

/// 2D simplex noise generator. Samples are in `[-1, 1]`.
#[derive(Clone)]
pub struct SimplexNoise {
    /// 256-entry shuffle, doubled to skip index wrapping.
    perm: Box<[u8; 512]>,
}

impl SimplexNoise {
    /// Skewing factor for the 2D simplex grid: `(sqrt(3) - 1) / 2`.
    const F2: f64 = 0.366_025_403_784_438_6;
    /// Unskewing factor: `(3 - sqrt(3)) / 6`.
    const G2: f64 = 0.211_324_865_405_187_1;

    /// Creates a generator from a seed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(seed: WorldSeed) -> Self {
        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);

        // xorshift64; a zero state would never advance
        let mut state = seed.value() | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            table.swap(i, (state % (i as u64 + 1)) as usize);
        }

        let mut perm = Box::new([0u8; 512]);
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn hash(&self, i: i32, j: i32) -> usize {
        let i = (i & 255) as usize;
        let j = (j & 255) as usize;
        usize::from(self.perm[i + usize::from(self.perm[j])])
    }

    #[inline]
    fn corner(&self, x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t <= 0.0 {
            return 0.0;
        }
        let [gx, gy] = GRADIENTS[hash & 7];
        let t2 = t * t;
        t2 * t2 * (gx * x + gy * y)
    }

    /// Samples noise at `(x, y)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = (x + skew).floor() as i32;
        let j = (y + skew).floor() as i32;

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Lower or upper triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let n = self.corner(x0, y0, self.hash(i, j))
            + self.corner(x1, y1, self.hash(i + i1, j + j1))
            + self.corner(x2, y2, self.hash(i + 1, j + 1));

        (70.0 * n).clamp(-1.0, 1.0)
    }

    /// Fractal Brownian motion: `octaves` layers, each at double the
    /// frequency and half the amplitude of the previous one.
    ///
    /// Normalized back to `[-1, 1]`.
    #[must_use]
    pub fn fbm(&self, x: f64, y: f64, octaves: u32) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        total / norm
    }
}

/// Settings for one noise layer (`[terrain.temperature]` etc.).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerConfig {
    /// Disabled layers always read 0.
    pub enabled: bool,
    /// Base frequency, in cycles per voxel.
    pub frequency: f64,
    /// Fractal octaves.
    pub octaves: u32,
    /// Mixed with the world seed.
    pub seed: u64,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: 0.0008,
            octaves: 8,
            seed: 0,
        }
    }
}

/// A configured noise layer that samples into `[0, 1]`.
#[derive(Clone)]
pub struct NoiseLayer {
    noise: Option<SimplexNoise>,
    frequency: f64,
    octaves: u32,
}

impl NoiseLayer {
    /// Builds a layer from its config and the world seed.
    #[must_use]
    pub fn new(config: &NoiseLayerConfig, world: WorldSeed) -> Self {
        Self {
            noise: config
                .enabled
                .then(|| SimplexNoise::new(world.derive(config.seed))),
            frequency: config.frequency,
            octaves: config.octaves,
        }
    }

    /// Returns true if the layer produces noise.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.noise.is_some()
    }

    /// Samples at a world voxel column, mapped from `[-1, 1]` to `[0, 1]`.
    ///
    /// Disabled layers return 0.
    #[must_use]
    pub fn sample01(&self, x: i32, y: i32) -> f64 {
        self.noise.as_ref().map_or(0.0, |noise| {
            let value = noise.fbm(
                f64::from(x) * self.frequency,
                f64::from(y) * self.frequency,
                self.octaves,
            );
            (value + 1.0) * 0.5
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let a = SimplexNoise::new(WorldSeed::new(12345));
        let b = SimplexNoise::new(WorldSeed::new(12345));

        for i in 0..100 {
            let x = f64::from(i) * 0.1;
            let y = f64::from(i) * 0.17;
            assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = SimplexNoise::new(WorldSeed::new(1));
        let b = SimplexNoise::new(WorldSeed::new(2));

        let differs = (0..50).any(|i| {
            let x = f64::from(i) * 0.37 + 0.5;
            (a.sample(x, x * 0.7) - b.sample(x, x * 0.7)).abs() > 1e-9
        });
        assert!(differs, "different seeds should produce different fields");
    }

    #[test]
    fn test_range_and_continuity() {
        let noise = SimplexNoise::new(WorldSeed::new(42));

        for i in 0..5000 {
            let x = f64::from(i) * 0.1 - 250.0;
            let y = f64::from(i) * 0.13 - 325.0;
            let value = noise.sample(x, y);
            assert!((-1.0..=1.0).contains(&value), "{value} out of range");

            let nearby = noise.sample(x + 0.001, y);
            assert!((value - nearby).abs() < 0.02, "noise should be continuous");
        }
    }

    #[test]
    fn test_layer_maps_to_unit_range() {
        let layer = NoiseLayer::new(&NoiseLayerConfig::default(), WorldSeed::default());

        for i in -200..200 {
            let value = layer.sample01(i * 97, i * -31);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_disabled_layer_reads_zero() {
        let config = NoiseLayerConfig {
            enabled: false,
            ..NoiseLayerConfig::default()
        };
        let layer = NoiseLayer::new(&config, WorldSeed::default());

        assert!(!layer.is_enabled());
        assert!(layer.sample01(1000, -1000).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seed_derivation() {
        let base = WorldSeed::new(42);

        assert_ne!(base.derive(1), base.derive(2));
        assert_eq!(base.derive(1), base.derive(1));
        assert_ne!(base.derive(1), base);
    }
}

//! Layered gradient-noise field generation.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::extrema::{ChannelExtrema, HEIGHT_CHANNEL};
use crate::tilemap::Tilemap;

/// Smallest usable noise scale. Smaller values are raised to this floor.
pub const MIN_SCALE: f32 = 0.001;

/// Range of the per-octave offsets drawn from the seeded stream.
const OCTAVE_OFFSET_RANGE: i32 = 10_000;

/// Parameters of one layered noise field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// World units per noise period (larger = smoother terrain)
    pub scale: f32,
    /// Number of noise layers summed together
    pub octaves: u32,
    /// Amplitude multiplier per octave (0.0-1.0)
    pub persistence: f32,
    /// Frequency multiplier per octave (>= 1.0)
    pub lacunarity: f32,
    /// Which extrema channel this field accumulates into
    pub channel: usize,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            scale: 40.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            channel: HEIGHT_CHANNEL,
        }
    }
}

impl NoiseParams {
    /// Clamp to the ranges the generator assumes.
    pub fn validated(mut self) -> Self {
        if !(self.scale > MIN_SCALE) {
            self.scale = MIN_SCALE;
        }
        if self.lacunarity < 1.0 {
            self.lacunarity = 1.0;
        }
        self.octaves = self.octaves.max(1);
        self.persistence = self.persistence.clamp(0.0, 1.0);
        self.channel = self.channel.min(super::extrema::CHANNEL_COUNT - 1);
        self
    }
}

/// Generate a `(width * lod) x (height * lod)` field of layered gradient noise.
///
/// Grid coordinates are centered on the field before the world offset is
/// applied, so neighbouring chunks sampled with offsets one chunk apart line up.
/// Every raw value is folded into `extrema` for `params.channel`.
///
/// The octave offset stream is re-seeded from `seed` on every call, which makes
/// the output a pure function of `(width, height, lod, params, seed, offset)`.
pub fn generate_noise_field(
    width: usize,
    height: usize,
    lod: usize,
    params: &NoiseParams,
    seed: u64,
    offset: [f32; 2],
    extrema: &mut ChannelExtrema,
) -> Tilemap<f32> {
    assert!(params.scale > 0.0, "noise scale must be positive");
    assert!(params.octaves >= 1, "at least one octave is required");

    let lod = lod.max(1);
    let width = width * lod;
    let height = height * lod;
    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let perlin = Perlin::new(perlin_seed(seed));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let octave_offsets: Vec<(f64, f64)> = (0..params.octaves)
        .map(|_| {
            let x = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 + offset[0] as f64;
            let y = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 + offset[1] as f64;
            (x, y)
        })
        .collect();

    let scale = params.scale as f64;
    let lod_f = lod as f64;
    let mut field = Tilemap::new_with(width, height, 0.0f32);

    for (x, y, cell) in field.iter_mut() {
        let mut value = 0.0f32;
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f64;

        for &(ox, oy) in &octave_offsets {
            let tx = ((x as f64 - half_width) / lod_f + ox) / scale * frequency;
            let ty = ((y as f64 - half_height) / lod_f + oy) / scale * frequency;
            value += gradient_noise(&perlin, tx, ty) * amplitude;

            amplitude *= params.persistence;
            frequency *= params.lacunarity as f64;
        }

        *cell = value;
        extrema.accumulate(params.channel, value);
    }

    field
}

/// Fold a 64-bit seed into the 32-bit Perlin permutation seed.
fn perlin_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Perlin noise remapped from [-1, 1] to roughly [0, 1].
#[inline]
fn gradient_noise(perlin: &Perlin, x: f64, y: f64) -> f32 {
    (perlin.get([x, y]) * 0.5 + 0.5) as f32
}

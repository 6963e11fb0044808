//! Hydraulic erosion simulation using particle-based water droplets.
//!
//! Each droplet is dropped on a random interior cell and accelerates along the
//! bilinear height gradient. Moving downhill fast gives it capacity to pick up
//! material from the cell it leaves; as it slows or evaporates it drops part of
//! its load back. The heightfield is mutated in place and the channel extrema
//! follow every change, since erosion can push heights outside the range the
//! field was normalized to.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::erosion::params::ErosionParams;
use crate::erosion::utils::{cell_height, gradient_at, in_interior};
use crate::erosion::ErosionStats;
use crate::noise_field::ChannelExtrema;
use crate::tilemap::Tilemap;

/// A water droplet for hydraulic erosion simulation
struct WaterDroplet {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    /// Water volume
    volume: f32,
    /// Carried sediment
    sediment: f32,
}

impl WaterDroplet {
    fn new(x: f32, y: f32, volume: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            volume,
            sediment: 0.0,
        }
    }
}

/// Why a droplet stopped.
enum DropletEnd {
    Expired,
    Stalled,
    LeftField,
}

/// Run hydraulic erosion over `heightmap`.
///
/// Algorithm, per droplet:
/// 1. Spawn on a random cell with a one-cell margin, zero velocity and sediment
/// 2. For up to `particle_lifetime` steps:
///    a. Sample the bilinear gradient at the droplet position
///    b. Accelerate: `v += gradient / volume`; stop if the speed is zero
///    c. Stop if the next position leaves the interior
///    d. Capacity = `volume * |v| * (h[current] - h[next])`, floored at 0
///    e. `deposit = capacity - sediment * deposition_rate`; subtract it from the
///       current cell (negative values deposit material)
///    f. `sediment += deposit`, evaporate, move
///
/// The random stream is seeded once from `seed` and consumed sequentially, so
/// the result depends only on `(seed, heightmap, params)`.
pub fn erode(
    seed: u64,
    heightmap: &mut Tilemap<f32>,
    channel: usize,
    params: &ErosionParams,
    extrema: &mut ChannelExtrema,
) -> ErosionStats {
    let mut stats = ErosionStats::default();

    let width = heightmap.width;
    let height = heightmap.height;
    if width < 3 || height < 3 {
        debug!(width, height, "heightfield has no interior, skipping erosion");
        return stats;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for _ in 0..params.iteration_count {
        stats.iterations += 1;

        let start_x = rng.gen_range(1..width - 1) as f32;
        let start_y = rng.gen_range(1..height - 1) as f32;
        let mut droplet = WaterDroplet::new(start_x, start_y, params.start_volume);

        let mut end = DropletEnd::Expired;
        for _ in 0..params.particle_lifetime {
            stats.steps_taken += 1;

            let (grad_x, grad_y) = gradient_at(heightmap, droplet.x, droplet.y);
            droplet.vx += grad_x / droplet.volume;
            droplet.vy += grad_y / droplet.volume;

            let speed = (droplet.vx * droplet.vx + droplet.vy * droplet.vy).sqrt();
            if speed == 0.0 {
                end = DropletEnd::Stalled;
                break;
            }

            let next_x = droplet.x + droplet.vx;
            let next_y = droplet.y + droplet.vy;
            if !in_interior(heightmap, next_x, next_y) {
                end = DropletEnd::LeftField;
                break;
            }

            let current_height = cell_height(heightmap, droplet.x, droplet.y);
            let next_height = cell_height(heightmap, next_x, next_y);
            let capacity = (droplet.volume * speed * (current_height - next_height)).max(0.0);

            let deposit = capacity - droplet.sediment * params.deposition_rate;
            let eroded_height = current_height - deposit;
            heightmap.set(droplet.x as usize, droplet.y as usize, eroded_height);
            extrema.accumulate(channel, eroded_height);

            if deposit > 0.0 {
                stats.total_eroded += deposit as f64;
            } else {
                stats.total_deposited += -deposit as f64;
            }

            droplet.sediment += deposit;
            droplet.volume *= 1.0 - params.evaporation_rate;
            droplet.x = next_x;
            droplet.y = next_y;
        }

        match end {
            DropletEnd::Expired => stats.expired += 1,
            DropletEnd::Stalled => stats.stalled += 1,
            DropletEnd::LeftField => stats.left_field += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_field::{generate_noise_field, normalize_field, Extrema, NoiseParams, HEIGHT_CHANNEL};

    fn normalized_field(seed: u64) -> (Tilemap<f32>, ChannelExtrema) {
        let mut extrema = ChannelExtrema::new();
        let mut field = generate_noise_field(48, 48, 1, &NoiseParams::default(), seed, [0.0, 0.0], &mut extrema);
        normalize_field(&mut field, HEIGHT_CHANNEL, &extrema);
        extrema.set(HEIGHT_CHANNEL, Extrema::UNIT);
        (field, extrema)
    }

    #[test]
    fn test_flat_field_is_unchanged() {
        for seed in [0, 1, 42, 9999] {
            let mut field = Tilemap::new_with(10, 10, 0.5f32);
            let mut extrema = ChannelExtrema::new();
            let params = ErosionParams { iteration_count: 500, ..Default::default() };

            let stats = erode(seed, &mut field, HEIGHT_CHANNEL, &params, &mut extrema);

            assert_eq!(field, Tilemap::new_with(10, 10, 0.5f32));
            assert_eq!(stats.stalled, 500);
            assert!(extrema.read(HEIGHT_CHANNEL).is_empty());
        }
    }

    #[test]
    fn test_erosion_is_deterministic() {
        let (mut a, mut extrema_a) = normalized_field(11);
        let (mut b, mut extrema_b) = normalized_field(11);
        let params = ErosionParams::fast();

        erode(77, &mut a, HEIGHT_CHANNEL, &params, &mut extrema_a);
        erode(77, &mut b, HEIGHT_CHANNEL, &params, &mut extrema_b);

        assert_eq!(a, b);
        assert_eq!(extrema_a, extrema_b);
    }

    #[test]
    fn test_erosion_changes_sloped_terrain_and_tracks_extrema() {
        let (mut field, mut extrema) = normalized_field(3);
        let before = field.clone();

        let stats = erode(5, &mut field, HEIGHT_CHANNEL, &ErosionParams::fast(), &mut extrema);

        assert_ne!(field, before);
        assert!(stats.total_eroded > 0.0);
        let range = extrema.read(HEIGHT_CHANNEL);
        for (_, _, &h) in field.iter() {
            assert!(h.is_finite());
            assert!(h >= range.min && h <= range.max);
        }
    }

    #[test]
    fn test_border_cells_are_never_touched() {
        // Steep ramp that drives droplets off the field in a few steps.
        let size = 12;
        let data = (0..size * size).map(|i| ((i % size) * 10) as f32).collect();
        let mut field = Tilemap::from_vec(size, size, data).unwrap();
        let before = field.clone();
        let mut extrema = ChannelExtrema::new();

        let params = ErosionParams { iteration_count: 3_000, ..Default::default() };
        let stats = erode(1, &mut field, HEIGHT_CHANNEL, &params, &mut extrema);

        assert!(stats.left_field > 0);
        for (x, y, &h) in field.iter() {
            if field.is_edge(x, y) {
                assert_eq!(h, *before.get(x, y), "edge cell ({x}, {y}) was modified");
            }
        }
    }

    #[test]
    fn test_tiny_field_is_skipped() {
        let mut field = Tilemap::new_with(2, 2, 1.0f32);
        let mut extrema = ChannelExtrema::new();
        let stats = erode(0, &mut field, HEIGHT_CHANNEL, &ErosionParams::fast(), &mut extrema);
        assert_eq!(stats.iterations, 0);
    }
}

//! Poisson disk sampling (Bridson's algorithm) for object scattering.
//!
//! Points are produced in world units over a shared heightfield of
//! `width x height` cells at a given LOD factor. Any two accepted points are at
//! least `min_radius` apart.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chunks::BORDER_SIZE;

/// Generate a blue-noise point set.
///
/// The active list is seeded once per chunk with a random start point; start
/// points themselves are not emitted. For each randomly picked active point,
/// up to `rejection_iterations` candidates are drawn from the annulus
/// `[min_radius, 2 * min_radius]`. The first candidate with no accepted point
/// closer than `min_radius` in the surrounding 5x5 background cells is
/// accepted; if none is, the active point is retired.
///
/// Placement is restricted to `[1/lod, (width - 2)/lod)` on x (same on y),
/// which keeps points off the field's border ring.
///
/// A single stream seeded from `seed` is consumed in order, so the result is
/// deterministic for fixed inputs.
pub fn poisson_points(
    seed: u64,
    width: usize,
    height: usize,
    lod: usize,
    chunk_count: usize,
    min_radius: f32,
    rejection_iterations: usize,
) -> Vec<[f32; 2]> {
    let mut points: Vec<[f32; 2]> = Vec::new();
    if !(min_radius > 0.0) {
        return points;
    }

    let lod = lod.max(1) as f32;
    let min_position = 1.0 / lod;
    let max_x = width.saturating_sub(BORDER_SIZE * 2) as f32 / lod;
    let max_y = height.saturating_sub(BORDER_SIZE * 2) as f32 / lod;
    if max_x <= min_position || max_y <= min_position {
        return points;
    }

    let mut grid = BackgroundGrid::new(max_x, max_y, min_radius);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut active: Vec<[f32; 2]> = Vec::new();

    for _ in 0..chunk_count {
        active.push([
            rng.gen_range(min_position..max_x),
            rng.gen_range(min_position..max_y),
        ]);

        while !active.is_empty() {
            let active_index = rng.gen_range(0..active.len());
            let origin = active[active_index];
            let mut found = false;

            for _ in 0..rejection_iterations {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let distance = rng.gen_range(min_radius..=min_radius * 2.0);
                let candidate = [
                    origin[0] + angle.sin() * distance,
                    origin[1] + angle.cos() * distance,
                ];

                let in_region = candidate[0] >= min_position
                    && candidate[0] < max_x
                    && candidate[1] >= min_position
                    && candidate[1] < max_y;
                if in_region && grid.is_clear(candidate, &points) {
                    points.push(candidate);
                    active.push(candidate);
                    grid.register(candidate, points.len());
                    found = true;
                    break;
                }
            }

            if !found {
                active.swap_remove(active_index);
            }
        }
    }

    points
}

/// Acceleration grid with cells of `min_radius / sqrt(2)`, so each cell holds
/// at most one point. Stores point index + 1; 0 means empty.
struct BackgroundGrid {
    cell_size: f32,
    min_radius: f32,
    cols: usize,
    rows: usize,
    cells: Vec<usize>,
}

impl BackgroundGrid {
    fn new(max_x: f32, max_y: f32, min_radius: f32) -> Self {
        let cell_size = min_radius / std::f32::consts::SQRT_2;
        let cols = ((max_x / cell_size).ceil() as usize).max(1);
        let rows = ((max_y / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            min_radius,
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    fn cell_of(&self, p: [f32; 2]) -> (usize, usize) {
        let cx = ((p[0] / self.cell_size) as usize).min(self.cols - 1);
        let cy = ((p[1] / self.cell_size) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn register(&mut self, p: [f32; 2], slot: usize) {
        let (cx, cy) = self.cell_of(p);
        self.cells[cy * self.cols + cx] = slot;
    }

    /// No accepted point within `min_radius` among the 5x5 neighbouring cells.
    fn is_clear(&self, p: [f32; 2], points: &[[f32; 2]]) -> bool {
        let (cx, cy) = self.cell_of(p);
        let x_range = cx.saturating_sub(2)..=(cx + 2).min(self.cols - 1);
        let radius_sq = self.min_radius * self.min_radius;

        for y in cy.saturating_sub(2)..=(cy + 2).min(self.rows - 1) {
            for x in x_range.clone() {
                let slot = self.cells[y * self.cols + x];
                if slot == 0 {
                    continue;
                }
                let other = points[slot - 1];
                let dx = p[0] - other[0];
                let dy = p[1] - other[1];
                if dx * dx + dy * dy < radius_sq {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_min_distance(points: &[[f32; 2]], radius: f32) {
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
                assert!(d >= radius - 1e-4, "points {a:?} and {b:?} are {d} apart");
            }
        }
    }

    #[test]
    fn test_minimum_distance_holds() {
        for (radius, lod) in [(1.0, 1), (2.5, 2), (0.7, 4)] {
            let points = poisson_points(42, 64, 48, lod, 4, radius, 30);
            assert!(!points.is_empty());
            assert_min_distance(&points, radius);
        }
    }

    #[test]
    fn test_points_stay_inside_region() {
        let lod = 2;
        let points = poisson_points(7, 40, 40, lod, 1, 1.5, 20);
        let min = 1.0 / lod as f32;
        let max = (40 - 2) as f32 / lod as f32;
        for p in &points {
            assert!(p[0] >= min && p[0] < max);
            assert!(p[1] >= min && p[1] < max);
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let a = poisson_points(9, 50, 50, 1, 2, 2.0, 30);
        let b = poisson_points(9, 50, 50, 1, 2, 2.0, 30);
        let c = poisson_points(10, 50, 50, 1, 2, 2.0, 30);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_degenerate_inputs_yield_nothing() {
        assert!(poisson_points(1, 50, 50, 1, 0, 2.0, 30).is_empty());
        assert!(poisson_points(1, 50, 50, 1, 1, 0.0, 30).is_empty());
        assert!(poisson_points(1, 2, 2, 1, 1, 1.0, 30).is_empty());
        assert!(poisson_points(1, 50, 50, 1, 1, 2.0, 0).is_empty());
    }

    #[test]
    fn test_field_is_reasonably_filled() {
        // 30 rejection tries should cover a good share of the available area.
        let radius = 2.0;
        let points = poisson_points(3, 66, 66, 1, 1, radius, 30);
        let area = 63.0 * 63.0;
        let disk = std::f32::consts::PI * (radius / 2.0).powi(2);
        assert!(points.len() as f32 > 0.4 * area / disk / 2.0);
    }
}

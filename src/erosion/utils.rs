//! Utility functions for erosion calculations
//!
//! Gradient sampling and interior bounds for droplets. Unlike the mesh and
//! placement samplers these never clamp: callers keep droplets inside the
//! interior so every lookup is in range.

use crate::tilemap::Tilemap;

/// Whether a droplet at `(x, y)` can still sample its four gradient corners.
///
/// The interior excludes a one-cell margin on every side. The upper bound is
/// strict so that `floor(x) + 1 <= width - 1` always holds.
#[inline]
pub fn in_interior(heightmap: &Tilemap<f32>, x: f32, y: f32) -> bool {
    let max_x = (heightmap.width - 1) as f32;
    let max_y = (heightmap.height - 1) as f32;
    x >= 1.0 && x < max_x && y >= 1.0 && y < max_y
}

/// Height of the cell containing the fractional position `(x, y)`.
#[inline]
pub fn cell_height(heightmap: &Tilemap<f32>, x: f32, y: f32) -> f32 {
    *heightmap.get(x as usize, y as usize)
}

/// Bilinear height gradient at a fractional position.
///
/// Returns the downhill direction: a positive component means height decreases
/// along that axis. Expects `(x, y)` to satisfy [`in_interior`] or at least
/// `x < width - 1` and `y < height - 1`.
pub fn gradient_at(heightmap: &Tilemap<f32>, x: f32, y: f32) -> (f32, f32) {
    let x0 = x as usize;
    let y0 = y as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = *heightmap.get(x0, y0);
    let p10 = *heightmap.get(x0 + 1, y0);
    let p01 = *heightmap.get(x0, y0 + 1);
    let p11 = *heightmap.get(x0 + 1, y0 + 1);

    let grad_x = (p00 - p10) * fy + (p01 - p11) * (1.0 - fy);
    let grad_y = (p00 - p01) * fx + (p10 - p11) * (1.0 - fx);

    (grad_x, grad_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_flat() {
        let heightmap = Tilemap::new_with(4, 4, 5.0f32);
        let (gx, gy) = gradient_at(&heightmap, 1.5, 1.5);
        assert_eq!(gx, 0.0);
        assert_eq!(gy, 0.0);
    }

    #[test]
    fn test_gradient_points_downhill() {
        // Height rises with x, so the downhill x component is negative.
        let heightmap = Tilemap::from_vec(3, 3, vec![0.0f32, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0]).unwrap();
        let (gx, gy) = gradient_at(&heightmap, 0.5, 0.5);
        assert!((gx + 1.0).abs() < 1e-6);
        assert!(gy.abs() < 1e-6);
    }

    #[test]
    fn test_interior_upper_bound_is_strict() {
        let heightmap = Tilemap::new_with(10, 10, 0.0f32);
        assert!(in_interior(&heightmap, 1.0, 1.0));
        assert!(in_interior(&heightmap, 8.999, 8.999));
        assert!(!in_interior(&heightmap, 9.0, 5.0));
        assert!(!in_interior(&heightmap, 5.0, 0.999));
    }
}

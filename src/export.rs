//! Preview image export.

use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use tracing::info;

use crate::error::TerrainError;
use crate::regions::RegionMap;
use crate::tilemap::Tilemap;

/// Color used for cells no region covers.
const UNCLASSIFIED: [u8; 3] = [255, 0, 255];

/// Grayscale image of a normalized field; values are clamped to [0, 1].
pub fn heightmap_image(field: &Tilemap<f32>) -> GrayImage {
    let mut img = ImageBuffer::new(field.width as u32, field.height as u32);
    for (x, y, &v) in field.iter() {
        img.put_pixel(x as u32, y as u32, Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8]));
    }
    img
}

pub fn export_heightmap(field: &Tilemap<f32>, path: &Path) -> Result<(), TerrainError> {
    heightmap_image(field).save(path)?;
    info!(path = %path.display(), "wrote heightmap preview");
    Ok(())
}

/// Slope (`1 - normal.y`) of a cell, from central differences of the mesh
/// elevation. `cell_size` is the world size of one cell (`1 / lod`).
fn cell_slope(field: &Tilemap<f32>, x: usize, y: usize, height_multiplier: f32, cell_size: f32) -> f32 {
    let x0 = x.saturating_sub(1);
    let x1 = (x + 1).min(field.width - 1);
    let y0 = y.saturating_sub(1);
    let y1 = (y + 1).min(field.height - 1);

    let span_x = (x1 - x0).max(1) as f32 * cell_size;
    let span_y = (y1 - y0).max(1) as f32 * cell_size;
    let dx = (field.get(x1, y) - field.get(x0, y)) * height_multiplier / span_x;
    let dy = (field.get(x, y1) - field.get(x, y0)) * height_multiplier / span_y;
    1.0 - 1.0 / (dx * dx + dy * dy + 1.0).sqrt()
}

/// Color every cell by its region, blending to the slope color on steep ground.
pub fn region_image(
    regions: &RegionMap,
    height: &Tilemap<f32>,
    humidity: &Tilemap<f32>,
    height_multiplier: f32,
    lod: usize,
) -> RgbImage {
    let cell_size = 1.0 / lod.max(1) as f32;
    let mut img = ImageBuffer::new(height.width as u32, height.height as u32);

    for (x, y, &h) in height.iter() {
        let color = match regions.evaluate(h, *humidity.get(x, y)) {
            Some(region) => region.color_at_slope(cell_slope(height, x, y, height_multiplier, cell_size)),
            None => UNCLASSIFIED,
        };
        img.put_pixel(x as u32, y as u32, Rgb(color));
    }
    img
}

pub fn export_region_map(
    regions: &RegionMap,
    height: &Tilemap<f32>,
    humidity: &Tilemap<f32>,
    height_multiplier: f32,
    lod: usize,
    path: &Path,
) -> Result<(), TerrainError> {
    region_image(regions, height, humidity, height_multiplier, lod).save(path)?;
    info!(path = %path.display(), "wrote region preview");
    Ok(())
}

/// Hill-shaded render of a normalized field, lit from the upper left.
pub fn render_shaded_heightmap(field: &Tilemap<f32>) -> RgbImage {
    let (lx, ly, lz) = {
        let (x, y, z) = (-0.7f32, -0.7f32, 0.5f32);
        let len = (x * x + y * y + z * z).sqrt();
        (x / len, y / len, z / len)
    };
    let mut img = ImageBuffer::new(field.width as u32, field.height as u32);

    for (x, y, &h) in field.iter() {
        let h_left = *field.get(x.saturating_sub(1), y);
        let h_right = *field.get((x + 1).min(field.width - 1), y);
        let h_up = *field.get(x, y.saturating_sub(1));
        let h_down = *field.get(x, (y + 1).min(field.height - 1));

        // Normalized heights are tiny per cell; exaggerate relief.
        let relief = 40.0;
        let nx = (h_left - h_right) * relief;
        let ny = (h_up - h_down) * relief;
        let len = (nx * nx + ny * ny + 1.0).sqrt();
        let diffuse = ((nx * lx + ny * ly + lz) / len).max(0.0);
        let ambient = 0.3;
        let lighting = (ambient + (1.0 - ambient) * diffuse).min(1.0);

        let t = h.clamp(0.0, 1.0);
        let base: [f32; 3] = if t < 0.3 {
            [40.0, 80.0 + t * 200.0, 170.0]
        } else if t < 0.6 {
            let k = (t - 0.3) / 0.3;
            [80.0 + k * 80.0, 140.0 - k * 60.0, 60.0 - k * 20.0]
        } else if t < 0.85 {
            let v = 160.0 - (t - 0.6) / 0.25 * 40.0;
            [v, v - 10.0, v - 20.0]
        } else {
            [240.0, 240.0, 245.0]
        };

        img.put_pixel(
            x as u32,
            y as u32,
            Rgb([
                (base[0] * lighting) as u8,
                (base[1] * lighting) as u8,
                (base[2] * lighting) as u8,
            ]),
        );
    }

    img
}

/// Tile equally sized images into a `cols`-wide grid separated by `gap`
/// pixels of dark background.
pub fn create_grid(images: &[RgbImage], cols: usize, gap: u32) -> RgbImage {
    let Some(first) = images.first() else {
        return ImageBuffer::new(1, 1);
    };
    let cols = cols.max(1);
    let rows = images.len().div_ceil(cols);
    let (cell_w, cell_h) = (first.width(), first.height());
    let width = cols as u32 * cell_w + (cols as u32 + 1) * gap;
    let height = rows as u32 * cell_h + (rows as u32 + 1) * gap;

    let mut grid: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([40, 40, 40]));
    for (idx, img) in images.iter().enumerate() {
        let ox = gap + (idx % cols) as u32 * (cell_w + gap);
        let oy = gap + (idx / cols) as u32 * (cell_h + gap);
        for (x, y, pixel) in img.enumerate_pixels() {
            if x < cell_w && y < cell_h {
                grid.put_pixel(ox + x, oy + y, *pixel);
            }
        }
    }
    grid
}

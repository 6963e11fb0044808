//! Object scattering over the final shared heightfield.
//!
//! Each descriptor gets its own Poisson point set. A point becomes a
//! [`PlacedObject`] when the terrain under it is inside the descriptor's
//! height window, flat enough, and owned by a chunk that exists.

use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunks::{ChunkCoord, ChunkLayout, ChunkTable};
use crate::curve::HeightCurve;
use crate::poisson::poisson_points;
use crate::tilemap::Tilemap;

/// A kind of object to scatter (tree, rock, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDescriptor {
    pub name: String,
    /// Minimum distance between two instances, in world units
    pub radius: f32,
    /// Candidates tried around each active point before it is retired
    pub rejection_iterations: usize,
    /// Normalized height window (inclusive)
    pub min_height: f32,
    pub max_height: f32,
    /// Largest accepted slope, as `1 - normal.y` (0 = flat)
    pub max_slope: f32,
    /// Uniform scale varies in `[1 - jitter, 1 + jitter]`
    pub scale_jitter: f32,
}

impl Default for ObjectDescriptor {
    fn default() -> Self {
        Self {
            name: "object".to_string(),
            radius: 1.0,
            rejection_iterations: 10,
            min_height: 0.2,
            max_height: 0.8,
            max_slope: 1.0,
            scale_jitter: 0.0,
        }
    }
}

impl ObjectDescriptor {
    pub fn validated(mut self) -> Self {
        if !(self.radius > 0.0) {
            self.radius = 0.1;
        }
        self.min_height = self.min_height.clamp(0.0, 1.0);
        self.max_height = self.max_height.clamp(self.min_height, 1.0);
        self.max_slope = self.max_slope.clamp(0.0, 1.0);
        self.scale_jitter = self.scale_jitter.clamp(0.0, 0.99);
        self
    }
}

/// One scattered instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedObject {
    /// Index into the descriptor list
    pub descriptor: usize,
    pub chunk: ChunkCoord,
    /// World position; y is the mesh elevation at that point
    pub position: Vec3,
    /// Rotation around +Y, in radians
    pub rotation: f32,
    pub scale: f32,
}

/// Outcome of a placement run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementReport {
    pub objects: Vec<PlacedObject>,
    /// Poisson points considered across all descriptors
    pub candidates: usize,
    pub rejected_height: usize,
    pub rejected_slope: usize,
    /// Points whose owning chunk is not in the chunk table
    pub misses: usize,
}

impl PlacementReport {
    /// Objects placed for one descriptor.
    pub fn count_for(&self, descriptor: usize) -> usize {
        self.objects.iter().filter(|o| o.descriptor == descriptor).count()
    }
}

/// Samples the shared heightfield in world space.
pub struct ObjectPlacer<'a> {
    pub shared: &'a Tilemap<f32>,
    pub layout: ChunkLayout,
    pub lod: usize,
    /// Chunk at the shared field's origin
    pub origin: ChunkCoord,
    pub curve: &'a dyn HeightCurve,
    pub height_multiplier: f32,
}

impl<'a> ObjectPlacer<'a> {
    /// Normalized height under a world point.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let lod = self.lod.max(1) as f32;
        self.shared.sample_bilinear(x * lod, z * lod)
    }

    fn elevation(&self, normalized: f32) -> f32 {
        self.curve.evaluate(normalized) * self.height_multiplier
    }

    /// Surface normal under a world point, from central differences of the
    /// mesh elevation.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let step = 1.0 / self.lod.max(1) as f32;
        let dx = self.elevation(self.height_at(x + step, z)) - self.elevation(self.height_at(x - step, z));
        let dz = self.elevation(self.height_at(x, z + step)) - self.elevation(self.height_at(x, z - step));
        Vec3::new(-dx / (2.0 * step), 1.0, -dz / (2.0 * step))
            .try_normalize()
            .unwrap_or(Vec3::Y)
    }

    /// `1 - normal.y`: 0 on flat ground, approaching 1 on cliffs.
    pub fn slope_at(&self, x: f32, z: f32) -> f32 {
        1.0 - self.normal_at(x, z).y
    }

    /// Chunk whose emitted area contains a world point.
    ///
    /// The strip past the last stride belongs to the last window along
    /// that axis.
    pub fn owning_chunk(&self, x: f32, z: f32) -> ChunkCoord {
        let lod = self.lod.max(1) as f32;
        let (sx, sz) = self.layout.stride();
        let overlap = self.layout.overlap();
        let last_x = (self.shared.width.saturating_sub(overlap) / sx).max(1) as i32 - 1;
        let last_z = (self.shared.height.saturating_sub(overlap) / sz).max(1) as i32 - 1;
        let cx = ((x * lod / sx as f32).floor() as i32).min(last_x);
        let cz = ((z * lod / sz as f32).floor() as i32).min(last_z);
        ChunkCoord::new(self.origin.x + cx, self.origin.z + cz)
    }

    /// Scatter every descriptor in order.
    ///
    /// All descriptors sample points from the same `seed`; rotation and scale
    /// jitter come from one stream shared across descriptors, so reordering
    /// descriptors changes the result.
    pub fn place<T>(
        &self,
        seed: u64,
        chunk_count: usize,
        descriptors: &[ObjectDescriptor],
        chunks: &ChunkTable<T>,
    ) -> PlacementReport {
        let mut report = PlacementReport::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for (index, descriptor) in descriptors.iter().enumerate() {
            let points = poisson_points(
                seed,
                self.shared.width,
                self.shared.height,
                self.lod,
                chunk_count,
                descriptor.radius,
                descriptor.rejection_iterations,
            );
            report.candidates += points.len();

            for [x, z] in points {
                let height = self.height_at(x, z);
                if height < descriptor.min_height || height > descriptor.max_height {
                    report.rejected_height += 1;
                    continue;
                }
                if self.slope_at(x, z) > descriptor.max_slope {
                    report.rejected_slope += 1;
                    continue;
                }

                let chunk = self.owning_chunk(x, z);
                if !chunks.contains(chunk) {
                    warn!(object = %descriptor.name, %chunk, x, z, "no chunk owns placement point");
                    report.misses += 1;
                    continue;
                }

                let rotation = rng.gen_range(0.0..std::f32::consts::TAU);
                let scale = if descriptor.scale_jitter > 0.0 {
                    1.0 + rng.gen_range(-descriptor.scale_jitter..=descriptor.scale_jitter)
                } else {
                    1.0
                };

                report.objects.push(PlacedObject {
                    descriptor: index,
                    chunk,
                    position: Vec3::new(x, self.elevation(height), z),
                    rotation,
                    scale,
                });
            }

            debug!(
                object = %descriptor.name,
                placed = report.count_for(index),
                "scattered objects"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::BORDER_SIZE;
    use crate::curve::LinearCurve;

    const TILE: usize = 16;

    fn two_chunk_field(value: f32) -> (Tilemap<f32>, ChunkLayout) {
        let layout = ChunkLayout::new(TILE, TILE, BORDER_SIZE);
        let (w, h) = layout
            .shared_size(&[ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)])
            .unwrap();
        (Tilemap::new_with(w, h, value), layout)
    }

    fn table(coords: &[ChunkCoord]) -> ChunkTable<()> {
        let mut table = ChunkTable::new();
        for &c in coords {
            table.insert(c, ());
        }
        table
    }

    fn placer<'a>(shared: &'a Tilemap<f32>, layout: ChunkLayout) -> ObjectPlacer<'a> {
        ObjectPlacer {
            shared,
            layout,
            lod: 1,
            origin: ChunkCoord::new(0, 0),
            curve: &LinearCurve,
            height_multiplier: 10.0,
        }
    }

    fn descriptor(min_height: f32, max_height: f32) -> ObjectDescriptor {
        ObjectDescriptor {
            name: "tree".to_string(),
            radius: 1.5,
            rejection_iterations: 20,
            min_height,
            max_height,
            max_slope: 0.1,
            scale_jitter: 0.2,
        }
    }

    #[test]
    fn test_height_window_gates_placement() {
        let (shared, layout) = two_chunk_field(0.5);
        let chunks = table(&[ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]);
        let placer = placer(&shared, layout);

        let report = placer.place(1, 2, &[descriptor(0.6, 1.0), descriptor(0.4, 0.6)], &chunks);
        assert_eq!(report.count_for(0), 0);
        assert!(report.count_for(1) > 0);
        assert!(report.rejected_height > 0);
        for object in &report.objects {
            assert_eq!(object.descriptor, 1);
            assert!((object.position.y - 5.0).abs() < 1e-5);
            assert!(object.scale >= 0.8 && object.scale <= 1.2);
            assert!(object.rotation >= 0.0 && object.rotation < std::f32::consts::TAU);
        }
    }

    #[test]
    fn test_steep_ground_is_rejected() {
        let (mut shared, layout) = two_chunk_field(0.0);
        for (x, _, v) in shared.iter_mut() {
            *v = x as f32 / 28.0;
        }
        let chunks = table(&[ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]);
        let mut placer = placer(&shared, layout);
        placer.height_multiplier = 40.0;

        // Elevation rises ~1.4 per unit; well past a 0.1 slope limit.
        assert!(placer.slope_at(10.0, 5.0) > 0.1);
        let report = placer.place(2, 2, &[descriptor(0.0, 1.0)], &chunks);
        assert!(report.objects.is_empty());
        assert!(report.rejected_slope > 0);
    }

    #[test]
    fn test_missing_chunk_is_reported_and_skipped() {
        let (shared, layout) = two_chunk_field(0.5);
        let chunks = table(&[ChunkCoord::new(0, 0)]);
        let placer = placer(&shared, layout);

        let report = placer.place(3, 2, &[descriptor(0.0, 1.0)], &chunks);
        assert!(report.misses > 0);
        assert!(report.objects.iter().all(|o| o.chunk == ChunkCoord::new(0, 0)));
        assert_eq!(
            report.candidates,
            report.objects.len() + report.misses + report.rejected_height + report.rejected_slope
        );
    }

    #[test]
    fn test_owning_chunk_uses_world_stride() {
        let (shared, layout) = two_chunk_field(0.5);
        let mut placer = placer(&shared, layout);
        assert_eq!(placer.owning_chunk(12.9, 3.0), ChunkCoord::new(0, 0));
        assert_eq!(placer.owning_chunk(13.0, 3.0), ChunkCoord::new(1, 0));

        // Last strip of the shared field stays on the last chunk.
        assert_eq!(placer.owning_chunk(26.5, 5.0), ChunkCoord::new(1, 0));
        assert_eq!(placer.owning_chunk(5.0, 14.0), ChunkCoord::new(0, 0));

        placer.lod = 2;
        assert_eq!(placer.owning_chunk(6.4, 3.0), ChunkCoord::new(0, 0));
        assert_eq!(placer.owning_chunk(6.5, 3.0), ChunkCoord::new(1, 0));
    }

    #[test]
    fn test_full_map_has_no_misses() {
        let layout = ChunkLayout::new(TILE, TILE, BORDER_SIZE);
        let coords = [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(1, 0),
            ChunkCoord::new(0, 1),
            ChunkCoord::new(1, 1),
        ];
        let (w, h) = layout.shared_size(&coords).unwrap();
        assert_eq!((w, h), (29, 29));
        let shared = Tilemap::new_with(w, h, 0.5f32);
        let chunks = table(&coords);
        let placer = placer(&shared, layout);

        let mut dense = descriptor(0.0, 1.0);
        dense.radius = 0.5;
        let report = placer.place(7, 4, &[dense], &chunks);
        assert!(report.objects.iter().any(|o| o.position.x >= 26.0));
        assert_eq!(report.misses, 0);
        assert_eq!(report.objects.len(), report.candidates);
    }

    #[test]
    fn test_placement_is_deterministic() {
        let (shared, layout) = two_chunk_field(0.5);
        let chunks = table(&[ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]);
        let placer = placer(&shared, layout);
        let descriptors = [descriptor(0.0, 1.0)];
        assert_eq!(
            placer.place(5, 2, &descriptors, &chunks),
            placer.place(5, 2, &descriptors, &chunks)
        );
    }

    #[test]
    fn test_validated_orders_height_window() {
        let d = ObjectDescriptor {
            radius: -1.0,
            min_height: 0.7,
            max_height: 0.2,
            ..Default::default()
        }
        .validated();
        assert!(d.radius > 0.0);
        assert!(d.max_height >= d.min_height);
    }
}

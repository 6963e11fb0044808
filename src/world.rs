//! Terrain context
//!
//! Owns everything one generation pass produces: the per-channel extrema, the
//! chunk table, the stitched shared fields and the scattered objects.

use tracing::{debug, info};

use crate::chunks::{ChunkCoord, ChunkLayout, ChunkTable, BORDER_SIZE};
use crate::config::TerrainConfig;
use crate::curve::HeightCurve;
use crate::erosion::{self, ErosionStats};
use crate::error::TerrainError;
use crate::mesh::{build_terrain_mesh, MeshData};
use crate::noise_field::{generate_noise_field, normalize_field, ChannelExtrema, Extrema};
use crate::placement::{ObjectPlacer, PlacedObject, PlacementReport};
use crate::tilemap::Tilemap;

/// Generated data of one chunk.
#[derive(Clone, Debug)]
pub struct ChunkData {
    pub coord: ChunkCoord,
    /// World-space noise origin of the tile
    pub world_offset: [f32; 2],
    /// Normalized, eroded height tile including the border ring
    pub heightfield: Tilemap<f32>,
    /// Normalized humidity tile
    pub humidity: Tilemap<f32>,
    pub mesh: MeshData,
}

/// A chunked terrain and the state needed to regenerate it.
pub struct TerrainMap {
    config: TerrainConfig,
    extrema: ChannelExtrema,
    chunks: ChunkTable<ChunkData>,
    shared_height: Option<Tilemap<f32>>,
    shared_humidity: Option<Tilemap<f32>>,
    placement: PlacementReport,
    erosion_stats: Option<ErosionStats>,
}

impl TerrainMap {
    /// An empty map; call [`regenerate`](Self::regenerate) to fill it.
    pub fn new(config: TerrainConfig) -> Self {
        Self {
            config: config.validated(),
            extrema: ChannelExtrema::new(),
            chunks: ChunkTable::new(),
            shared_height: None,
            shared_humidity: None,
            placement: PlacementReport::default(),
            erosion_stats: None,
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Changes take effect on the next regeneration.
    pub fn config_mut(&mut self) -> &mut TerrainConfig {
        &mut self.config
    }

    pub fn extrema(&self) -> &ChannelExtrema {
        &self.extrema
    }

    pub fn chunks(&self) -> &ChunkTable<ChunkData> {
        &self.chunks
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkData> {
        self.chunks.get(coord)
    }

    /// Stitched height field of the last pass, after erosion.
    pub fn shared_heightfield(&self) -> Option<&Tilemap<f32>> {
        self.shared_height.as_ref()
    }

    pub fn shared_humidity(&self) -> Option<&Tilemap<f32>> {
        self.shared_humidity.as_ref()
    }

    pub fn placed_objects(&self) -> &[PlacedObject] {
        &self.placement.objects
    }

    pub fn placement_report(&self) -> &PlacementReport {
        &self.placement
    }

    /// `None` when erosion was disabled for the last pass.
    pub fn erosion_stats(&self) -> Option<&ErosionStats> {
        self.erosion_stats.as_ref()
    }

    /// Tile geometry for the current config.
    pub fn layout(&self) -> ChunkLayout {
        let tile = self.config.tile_size();
        ChunkLayout::new(tile, tile, BORDER_SIZE)
    }

    /// Drop every chunk and reset the extrema.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.extrema.reset();
        self.shared_height = None;
        self.shared_humidity = None;
        self.placement = PlacementReport::default();
        self.erosion_stats = None;
    }

    /// Regenerate using the configured height curve.
    pub fn regenerate(&mut self) -> Result<(), TerrainError> {
        let curve = self.config.height_curve.clone();
        self.regenerate_with_curve(&curve)
    }

    /// Run the full pipeline with a caller-supplied height curve.
    ///
    /// Chunks are produced in z-major order (all of row z = 0 first), which is
    /// also the order the stitcher writes overlapping windows in.
    pub fn regenerate_with_curve(&mut self, curve: &dyn HeightCurve) -> Result<(), TerrainError> {
        self.clear();
        self.config = self.config.clone().validated();

        let config = &self.config;
        let lod = config.lod_factor();
        let layout = self.layout();
        let height_channel = config.height_noise.channel;
        let humidity_channel = config.humidity_noise.channel;

        info!(
            seed = config.seed,
            chunks = config.chunk_count(),
            tile = layout.tile_width,
            lod,
            "regenerating terrain"
        );

        let coords: Vec<ChunkCoord> = (0..config.map_size_z as i32)
            .flat_map(|z| (0..config.map_size_x as i32).map(move |x| ChunkCoord::new(x, z)))
            .collect();

        // Stage 1: raw noise for every chunk, accumulating the shared extrema
        let mut tiles: Vec<(ChunkCoord, [f32; 2], Tilemap<f32>, Tilemap<f32>)> = Vec::with_capacity(coords.len());
        for &coord in &coords {
            let offset = layout.world_offset(coord, lod);
            let height = generate_noise_field(
                config.chunk_size,
                config.chunk_size,
                lod,
                &config.height_noise,
                config.seed,
                offset,
                &mut self.extrema,
            );
            let humidity = generate_noise_field(
                config.chunk_size,
                config.chunk_size,
                lod,
                &config.humidity_noise,
                config.seed,
                offset,
                &mut self.extrema,
            );
            tiles.push((coord, offset, height, humidity));
        }

        // Stage 2: normalize against the full pass range, then terrace
        for (_, _, height, humidity) in &mut tiles {
            normalize_field(height, height_channel, &self.extrema);
            normalize_field(humidity, humidity_channel, &self.extrema);
            if let Some(cascade) = &config.cascade {
                cascade.apply(height);
            }
        }
        debug!(height = ?self.extrema.read(height_channel), "normalized chunk fields");

        // Stage 3: stitch and erode as one field
        let height_pairs: Vec<(ChunkCoord, &Tilemap<f32>)> = tiles.iter().map(|(c, _, h, _)| (*c, h)).collect();
        let mut shared_height = layout.combine(&height_pairs)?;
        let humidity_pairs: Vec<(ChunkCoord, &Tilemap<f32>)> = tiles.iter().map(|(c, _, _, m)| (*c, m)).collect();
        let shared_humidity = layout.combine(&humidity_pairs)?;

        self.extrema.set(height_channel, Extrema::UNIT);
        let erosion_params = config.erosion_params();
        if erosion_params.iteration_count > 0 {
            let stats = erosion::erode(
                config.seed,
                &mut shared_height,
                height_channel,
                &erosion_params,
                &mut self.extrema,
            );
            info!(
                droplets = stats.iterations,
                mean_path = stats.mean_path_length(),
                net_change = stats.net_change(),
                "eroded shared heightfield"
            );
            self.erosion_stats = Some(stats);
        }

        // Stage 4: cut the eroded field back into tiles and mesh them
        let eroded = layout.split(&shared_height, &coords)?;
        for ((coord, world_offset, _, humidity), heightfield) in tiles.into_iter().zip(eroded) {
            let mesh = build_terrain_mesh(&heightfield, config.height_multiplier, curve, lod);
            self.chunks.insert(
                coord,
                ChunkData {
                    coord,
                    world_offset,
                    heightfield,
                    humidity,
                    mesh,
                },
            );
        }

        // Stage 5: scatter objects over the final surface
        let placer = ObjectPlacer {
            shared: &shared_height,
            layout,
            lod,
            origin: ChunkCoord::new(0, 0),
            curve,
            height_multiplier: config.height_multiplier,
        };
        self.placement = placer.place(config.seed, coords.len(), &config.objects, &self.chunks);

        info!(
            chunks = self.chunks.len(),
            objects = self.placement.objects.len(),
            misses = self.placement.misses,
            "terrain ready"
        );

        self.shared_height = Some(shared_height);
        self.shared_humidity = Some(shared_humidity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erosion::{ErosionParams, ErosionPreset};
    use crate::noise_field::{CascadeFilter, HEIGHT_CHANNEL};

    fn small_config(seed: u64) -> TerrainConfig {
        TerrainConfig {
            map_size_x: 2,
            map_size_z: 2,
            chunk_size: 16,
            level_of_detail: 0,
            seed,
            erosion: Some(ErosionParams {
                iteration_count: 500,
                ..ErosionParams::fast()
            }),
            ..Default::default()
        }
    }

    fn generated(config: TerrainConfig) -> TerrainMap {
        let mut map = TerrainMap::new(config);
        map.regenerate().unwrap();
        map
    }

    #[test]
    fn test_chunks_are_generated_in_row_order() {
        let map = generated(small_config(1));
        let coords: Vec<ChunkCoord> = map.chunks().coords().collect();
        assert_eq!(
            coords,
            vec![
                ChunkCoord::new(0, 0),
                ChunkCoord::new(1, 0),
                ChunkCoord::new(0, 1),
                ChunkCoord::new(1, 1),
            ]
        );

        for (_, chunk) in map.chunks().iter() {
            assert_eq!((chunk.heightfield.width, chunk.heightfield.height), (16, 16));
            assert_eq!((chunk.humidity.width, chunk.humidity.height), (16, 16));
            assert_eq!(chunk.mesh.vertex_count(), 14 * 14);
            assert_eq!(chunk.mesh.triangle_count(), 2 * 13 * 13);
        }

        let shared = map.shared_heightfield().unwrap();
        let stride = map.layout().stride().0;
        assert_eq!(shared.width, stride + 16);
    }

    #[test]
    fn test_regeneration_is_deterministic() {
        let a = generated(small_config(77));
        let b = generated(small_config(77));
        assert_eq!(a.shared_heightfield(), b.shared_heightfield());
        assert_eq!(a.shared_humidity(), b.shared_humidity());
        assert_eq!(a.placed_objects(), b.placed_objects());
        assert_eq!(a.erosion_stats(), b.erosion_stats());

        let mut again = a;
        let before = again.shared_heightfield().cloned();
        again.regenerate().unwrap();
        assert_eq!(again.shared_heightfield().cloned(), before);

        let other = generated(small_config(78));
        assert_ne!(other.shared_heightfield(), b.shared_heightfield());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut map = generated(small_config(3));
        assert!(!map.chunks().is_empty());

        map.clear();
        assert!(map.chunks().is_empty());
        assert!(map.shared_heightfield().is_none());
        assert!(map.placed_objects().is_empty());
        assert!(map.erosion_stats().is_none());
        assert!(map.extrema().read(HEIGHT_CHANNEL).is_empty());
    }

    #[test]
    fn test_uneroded_fields_are_normalized() {
        let mut config = small_config(11);
        config.erosion = None;
        config.erosion_preset = ErosionPreset::None;
        let map = generated(config);

        assert!(map.erosion_stats().is_none());
        let (min, max) = map.shared_heightfield().unwrap().min_max().unwrap();
        assert!(min >= 0.0 && max <= 1.0);
        assert!(max - min > 0.5);
        assert_eq!(map.extrema().read(HEIGHT_CHANNEL), Extrema::UNIT);
    }

    #[test]
    fn test_neighbour_tiles_share_overlap() {
        let map = generated(small_config(5));
        let stride = map.layout().stride().0;
        let left = map.chunk(ChunkCoord::new(0, 0)).unwrap();
        let right = map.chunk(ChunkCoord::new(1, 0)).unwrap();

        for y in 0..16 {
            for k in 0..(16 - stride) {
                assert_eq!(left.heightfield.get(stride + k, y), right.heightfield.get(k, y));
            }
        }
    }

    #[test]
    fn test_custom_curve_scales_mesh() {
        let mut map = TerrainMap::new(small_config(9));
        map.regenerate_with_curve(&|_: f32| 0.5).unwrap();
        let multiplier = map.config().height_multiplier;
        for (_, chunk) in map.chunks().iter() {
            assert!(chunk.mesh.vertices.iter().all(|v| v.y == 0.5 * multiplier));
        }
    }

    #[test]
    fn test_objects_land_on_existing_chunks() {
        let map = generated(small_config(21));
        for object in map.placed_objects() {
            assert!(map.chunk(object.chunk).is_some());
        }
        let report = map.placement_report();
        assert_eq!(report.misses, 0);
        assert_eq!(
            report.candidates,
            report.objects.len() + report.misses + report.rejected_height + report.rejected_slope
        );
    }

    #[test]
    fn test_cascade_changes_heights() {
        let plain = generated(small_config(13));
        let mut config = small_config(13);
        config.cascade = Some(CascadeFilter::default());
        let terraced = generated(config);
        assert_ne!(plain.shared_heightfield(), terraced.shared_heightfield());
    }
}

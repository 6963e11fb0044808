//! Terrain configuration with JSON persistence.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::curve::KeyframeCurve;
use crate::erosion::{ErosionParams, ErosionPreset};
use crate::error::TerrainError;
use crate::noise_field::{CascadeFilter, NoiseParams, HUMIDITY_CHANNEL};
use crate::placement::ObjectDescriptor;
use crate::regions::RegionMap;

/// Largest map edge, in chunks.
pub const MAX_MAP_SIZE: usize = 10;
/// Highest level-of-detail setting.
pub const MAX_LEVEL_OF_DETAIL: usize = 5;
/// Smallest chunk edge that still leaves an interior after the border ring.
pub const MIN_CHUNK_SIZE: usize = 8;
/// Seeds drawn by [`TerrainConfig::reseed`] fall in `[0, SEED_RANGE)`.
pub const SEED_RANGE: u64 = 100_000;

/// Everything needed to regenerate a terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunks along x (1-10)
    pub map_size_x: usize,
    /// Chunks along z (1-10)
    pub map_size_z: usize,
    /// Chunk edge in world units; tiles are `chunk_size * lod` cells
    pub chunk_size: usize,
    /// 0-5; see [`TerrainConfig::lod_factor`]
    pub level_of_detail: usize,
    pub seed: u64,
    /// Mesh elevation of a normalized height of 1
    pub height_multiplier: f32,
    pub height_curve: KeyframeCurve,
    pub height_noise: NoiseParams,
    pub humidity_noise: NoiseParams,
    /// Terracing applied to the normalized height field
    pub cascade: Option<CascadeFilter>,
    pub erosion_preset: ErosionPreset,
    /// Explicit erosion parameters; overrides the preset when set
    pub erosion: Option<ErosionParams>,
    pub objects: Vec<ObjectDescriptor>,
    pub regions: RegionMap,
    /// Default tracing filter (RUST_LOG takes precedence)
    pub log_level: String,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            map_size_x: 2,
            map_size_z: 2,
            chunk_size: 64,
            level_of_detail: 0,
            seed: 0,
            height_multiplier: 20.0,
            height_curve: KeyframeCurve::default(),
            height_noise: NoiseParams::default(),
            humidity_noise: NoiseParams {
                scale: 120.0,
                octaves: 3,
                channel: HUMIDITY_CHANNEL,
                ..Default::default()
            },
            cascade: None,
            erosion_preset: ErosionPreset::Normal,
            erosion: None,
            objects: vec![ObjectDescriptor {
                name: "tree".to_string(),
                radius: 3.0,
                rejection_iterations: 10,
                min_height: 0.4,
                max_height: 0.7,
                max_slope: 0.3,
                scale_jitter: 0.2,
            }],
            regions: RegionMap::basic(),
            log_level: "info".to_string(),
        }
    }
}

impl TerrainConfig {
    /// Cells per world unit: 1 at level 0, otherwise `2 * level_of_detail`.
    pub fn lod_factor(&self) -> usize {
        if self.level_of_detail == 0 {
            1
        } else {
            self.level_of_detail * 2
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.map_size_x * self.map_size_z
    }

    /// Chunk tile edge in cells.
    pub fn tile_size(&self) -> usize {
        self.chunk_size * self.lod_factor()
    }

    /// Erosion parameters in effect, validated.
    pub fn erosion_params(&self) -> ErosionParams {
        self.erosion
            .clone()
            .unwrap_or_else(|| ErosionParams::from_preset(self.erosion_preset))
            .validated()
    }

    /// Clamp every setting into the range generation supports.
    pub fn validated(mut self) -> Self {
        self.map_size_x = self.map_size_x.clamp(1, MAX_MAP_SIZE);
        self.map_size_z = self.map_size_z.clamp(1, MAX_MAP_SIZE);
        self.level_of_detail = self.level_of_detail.min(MAX_LEVEL_OF_DETAIL);
        self.chunk_size = self.chunk_size.max(MIN_CHUNK_SIZE);
        if !(self.height_multiplier >= 0.0) {
            self.height_multiplier = 0.0;
        }
        self.height_noise = self.height_noise.validated();
        self.humidity_noise = self.humidity_noise.validated();
        self.cascade = self.cascade.map(CascadeFilter::validated);
        self.erosion = self.erosion.map(ErosionParams::validated);
        self.objects = self.objects.into_iter().map(ObjectDescriptor::validated).collect();
        self.regions.sort_levels();
        self
    }

    /// Draw a fresh seed in `[0, 100000)` and return it.
    pub fn reseed(&mut self) -> u64 {
        self.seed = random_seed();
        self.seed
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, TerrainError> {
        let contents = std::fs::read_to_string(path).map_err(TerrainError::ReadError)?;
        let config: TerrainConfig = serde_json::from_str(&contents).map_err(TerrainError::ParseError)?;
        info!(path = %path.display(), "loaded terrain config");
        Ok(config)
    }

    /// Save as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), TerrainError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(TerrainError::WriteError)?;
        }
        let serialized = serde_json::to_string_pretty(self).map_err(TerrainError::ParseError)?;
        std::fs::write(path, serialized).map_err(TerrainError::WriteError)?;
        Ok(())
    }
}

/// A random seed in `[0, 100000)`.
pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(0..SEED_RANGE)
}

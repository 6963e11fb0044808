//! Region classification by height and humidity.
//!
//! Humidity selects one of the active humidity levels; each level lists the
//! regions it contains, ordered by height threshold. The lowest region of a
//! level always starts at 0 so every height resolves to something.

use serde::{Deserialize, Serialize};

use crate::noise_field::inverse_lerp;
use crate::tilemap::Tilemap;

/// A terrain region (beach, grass, rock, snow...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub name: String,
    /// Normalized height at which this region starts
    pub height: f32,
    pub main_color: [u8; 3],
    /// Color used on steep ground
    pub slope_color: [u8; 3],
    /// Slope (`1 - normal.y`) at which the slope color takes over
    pub slope_threshold: f32,
    /// Width of the slope transition, as a fraction of the threshold
    pub slope_blend: f32,
    pub region_blend: f32,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            name: "region".to_string(),
            height: 0.0,
            main_color: [128, 128, 128],
            slope_color: [96, 96, 96],
            slope_threshold: 0.5,
            slope_blend: 0.7,
            region_blend: 0.5,
        }
    }
}

impl Region {
    /// Surface color for a given slope.
    pub fn color_at_slope(&self, slope: f32) -> [u8; 3] {
        let start = self.slope_threshold * (1.0 - self.slope_blend.clamp(0.0, 1.0));
        let t = if slope >= self.slope_threshold {
            1.0
        } else {
            inverse_lerp(start, self.slope_threshold, slope)
        };
        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            let a = self.main_color[i] as f32;
            let b = self.slope_color[i] as f32;
            *channel = (a + (b - a) * t).round() as u8;
        }
        out
    }
}

/// A humidity band and the regions it contains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumidityLevel {
    pub name: String,
    /// Inactive levels are skipped entirely
    pub active: bool,
    /// Indices into [`RegionMap::regions`], ascending by height
    pub included: Vec<usize>,
}

impl Default for HumidityLevel {
    fn default() -> Self {
        Self {
            name: "humidity".to_string(),
            active: true,
            included: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionMap {
    pub regions_blend: f32,
    pub humidity_levels: Vec<HumidityLevel>,
    pub regions: Vec<Region>,
}

impl RegionMap {
    /// A single humidity level with a classic water-to-snow ramp.
    pub fn basic() -> Self {
        let region = |name: &str, height: f32, main_color: [u8; 3], slope_color: [u8; 3]| Region {
            name: name.to_string(),
            height,
            main_color,
            slope_color,
            ..Default::default()
        };
        let regions = vec![
            region("water", 0.0, [40, 80, 170], [40, 80, 170]),
            region("sand", 0.3, [210, 200, 140], [170, 150, 110]),
            region("grass", 0.4, [80, 150, 60], [100, 90, 70]),
            region("rock", 0.7, [110, 100, 90], [80, 75, 70]),
            region("snow", 0.9, [240, 240, 245], [180, 180, 190]),
        ];
        Self {
            regions_blend: 0.1,
            humidity_levels: vec![HumidityLevel {
                name: "temperate".to_string(),
                active: true,
                included: (0..regions.len()).collect(),
            }],
            regions,
        }
    }

    pub fn active_level_count(&self) -> usize {
        self.humidity_levels.iter().filter(|l| l.active).count()
    }

    /// Active humidity level selected by a normalized humidity value.
    pub fn humidity_level(&self, humidity: f32) -> Option<&HumidityLevel> {
        let count = self.active_level_count();
        if count == 0 {
            return None;
        }
        let last = (count - 1) as f32;
        let index = (last * humidity.clamp(0.0, 1.0)).round_ties_even() as usize;
        self.humidity_levels.iter().filter(|l| l.active).nth(index)
    }

    /// Index of the region at `(height, humidity)`.
    ///
    /// Walks the selected level's regions in order and keeps the last one whose
    /// threshold is at or below `height`. The first region's threshold counts
    /// as 0. Returns `None` without active levels or when the selected level
    /// has no valid regions.
    pub fn evaluate_index(&self, height: f32, humidity: f32) -> Option<usize> {
        let level = self.humidity_level(humidity)?;
        let mut included = level.included.iter().copied().filter(|&i| i < self.regions.len());

        let mut found = included.next()?;
        for index in included {
            if height >= self.regions[index].height {
                found = index;
            } else {
                break;
            }
        }
        Some(found)
    }

    pub fn evaluate(&self, height: f32, humidity: f32) -> Option<&Region> {
        self.evaluate_index(height, humidity).map(|i| &self.regions[i])
    }

    /// Sort every level's included regions by ascending height threshold.
    pub fn sort_levels(&mut self) {
        let regions = &self.regions;
        for level in &mut self.humidity_levels {
            level.included.sort_by(|&a, &b| {
                let ha = regions.get(a).map_or(f32::MAX, |r| r.height);
                let hb = regions.get(b).map_or(f32::MAX, |r| r.height);
                ha.total_cmp(&hb)
            });
        }
    }

    /// Exchange two regions, keeping level memberships pointing at the same
    /// region data.
    pub fn swap_regions(&mut self, a: usize, b: usize) {
        if a >= self.regions.len() || b >= self.regions.len() || a == b {
            return;
        }
        self.regions.swap(a, b);
        for level in &mut self.humidity_levels {
            for index in &mut level.included {
                if *index == a {
                    *index = b;
                } else if *index == b {
                    *index = a;
                }
            }
        }
    }

    /// Remove a region and every reference to it.
    pub fn remove_region(&mut self, index: usize) -> Option<Region> {
        if index >= self.regions.len() {
            return None;
        }
        let removed = self.regions.remove(index);
        for level in &mut self.humidity_levels {
            level.included.retain(|&i| i != index);
            for i in &mut level.included {
                if *i > index {
                    *i -= 1;
                }
            }
        }
        Some(removed)
    }

    /// Classify every cell of a height field against a humidity field of the
    /// same size.
    pub fn region_index_map(&self, height: &Tilemap<f32>, humidity: &Tilemap<f32>) -> Tilemap<Option<usize>> {
        debug_assert_eq!((height.width, height.height), (humidity.width, humidity.height));
        let mut out = Tilemap::new_with(height.width, height.height, None);
        for (x, y, slot) in out.iter_mut() {
            *slot = self.evaluate_index(*height.get(x, y), *humidity.get(x, y));
        }
        out
    }
}

//! Cascade (terracing) filters for normalized fields.

use serde::{Deserialize, Serialize};

use crate::tilemap::Tilemap;

/// How cells are pulled towards cascade levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Pull each cell up towards the next level above it (stair steps)
    #[default]
    Step,
    /// Pull each cell towards the nearest level (softer terraces)
    Snap,
}

/// Terracing filter applied to normalized height fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeFilter {
    /// Number of terrace levels across [0, 1] (>= 1)
    pub count: u32,
    /// How far cells move towards their level (0.0-1.0)
    pub intensity: f32,
    pub mode: CascadeMode,
}

impl Default for CascadeFilter {
    fn default() -> Self {
        Self {
            count: 8,
            intensity: 0.5,
            mode: CascadeMode::Step,
        }
    }
}

impl CascadeFilter {
    pub fn validated(mut self) -> Self {
        self.count = self.count.max(1);
        self.intensity = self.intensity.clamp(0.0, 1.0);
        self
    }

    /// Apply the filter in place. Expects a field normalized to [0, 1].
    pub fn apply(&self, field: &mut Tilemap<f32>) {
        let count = self.count.max(1);
        let step = 1.0 / count as f32;

        for (_, _, value) in field.iter_mut() {
            for i in 0..=count {
                let level = step * i as f32;
                let hit = match self.mode {
                    CascadeMode::Step => *value < level,
                    CascadeMode::Snap => (level - *value).abs() < step * 0.5,
                };
                if hit {
                    *value = lerp(*value, level, self.intensity);
                    break;
                }
            }
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

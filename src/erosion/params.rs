//! Erosion simulation parameters and configuration

use serde::{Deserialize, Serialize};

/// Erosion intensity preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ErosionPreset {
    /// No erosion - raw terrain
    None,
    /// Minimal erosion - subtle smoothing
    Minimal,
    /// Normal erosion - balanced
    #[default]
    Normal,
    /// Dramatic erosion - deep gullies and long sediment trails
    Dramatic,
}

impl ErosionPreset {
    pub fn all() -> &'static [Self] {
        &[Self::None, Self::Minimal, Self::Normal, Self::Dramatic]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::None => "No droplets, noise is left as generated",
            Self::Minimal => "Few short-lived droplets that soften ridges",
            Self::Normal => "Droplet count and lifetime tuned for chunked maps",
            Self::Dramatic => "Deep gullies and long sediment trails",
        }
    }
}

impl std::fmt::Display for ErosionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Minimal => "minimal",
            Self::Normal => "normal",
            Self::Dramatic => "dramatic",
        };
        f.write_str(name)
    }
}

/// Droplet erosion parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    /// Number of water droplets to simulate
    pub iteration_count: usize,

    /// Maximum number of steps a droplet lives
    pub particle_lifetime: usize,

    /// Fraction of carried sediment dropped back each step (0.0-1.0)
    pub deposition_rate: f32,

    /// Fraction of droplet volume lost each step (0.0-1.0)
    /// Higher values = shorter effective droplet lifetimes
    pub evaporation_rate: f32,

    /// Initial water volume of each droplet (> 0)
    pub start_volume: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            iteration_count: 50_000,
            particle_lifetime: 30,
            deposition_rate: 0.3,
            evaporation_rate: 0.02,
            start_volume: 1.0,
        }
    }
}

/// Smallest start volume accepted; the velocity update divides by volume.
const MIN_START_VOLUME: f32 = 1e-3;
/// Droplets must keep some water after a step.
const MAX_EVAPORATION_RATE: f32 = 0.99;

impl ErosionParams {
    /// Create a fast configuration for testing (fewer iterations)
    pub fn fast() -> Self {
        Self {
            iteration_count: 2_000,
            ..Default::default()
        }
    }

    /// Create parameters from a preset
    pub fn from_preset(preset: ErosionPreset) -> Self {
        match preset {
            ErosionPreset::None => Self {
                iteration_count: 0,
                ..Default::default()
            },
            ErosionPreset::Minimal => Self {
                iteration_count: 10_000,
                particle_lifetime: 20,
                deposition_rate: 0.5,
                ..Default::default()
            },
            ErosionPreset::Normal => Self::default(),
            ErosionPreset::Dramatic => Self {
                iteration_count: 150_000,
                particle_lifetime: 60,
                deposition_rate: 0.1,
                evaporation_rate: 0.01,
                ..Default::default()
            },
        }
    }

    /// Clamp rates into their valid ranges.
    pub fn validated(mut self) -> Self {
        self.deposition_rate = self.deposition_rate.clamp(0.0, 1.0);
        self.evaporation_rate = self.evaporation_rate.clamp(0.0, MAX_EVAPORATION_RATE);
        if !(self.start_volume >= MIN_START_VOLUME) {
            self.start_volume = MIN_START_VOLUME;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_scale_iterations() {
        let counts: Vec<usize> = ErosionPreset::all()
            .iter()
            .map(|p| ErosionParams::from_preset(*p).iteration_count)
            .collect();
        assert_eq!(counts[0], 0);
        assert!(counts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_validated_keeps_volume_positive() {
        let params = ErosionParams {
            start_volume: 0.0,
            deposition_rate: 2.0,
            evaporation_rate: -1.0,
            ..Default::default()
        }
        .validated();
        assert!(params.start_volume > 0.0);
        assert_eq!(params.deposition_rate, 1.0);
        assert_eq!(params.evaporation_rate, 0.0);
    }

    #[test]
    fn test_preset_display_round_trips_through_serde() {
        let json = serde_json::to_string(&ErosionPreset::Dramatic).unwrap();
        assert_eq!(json, format!("\"{}\"", ErosionPreset::Dramatic));
    }
}

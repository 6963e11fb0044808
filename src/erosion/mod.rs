//! Erosion simulation module
//!
//! Particle-based hydraulic erosion over the stitched shared heightfield.
//! Chunks are eroded together so droplets flow across chunk seams.

pub mod hydraulic;
pub mod params;
pub mod utils;

pub use hydraulic::erode;
pub use params::{ErosionParams, ErosionPreset};

/// Statistics from erosion simulation
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ErosionStats {
    /// Number of droplets processed
    pub iterations: usize,
    /// Total number of droplet steps taken
    pub steps_taken: u64,
    /// Droplets that reached the end of their lifetime
    pub expired: usize,
    /// Droplets that stopped on flat ground (zero speed)
    pub stalled: usize,
    /// Droplets that left the field interior
    pub left_field: usize,
    /// Total material removed (in height units)
    pub total_eroded: f64,
    /// Total material deposited
    pub total_deposited: f64,
}

impl ErosionStats {
    /// Net material removed from the field (negative = net deposition).
    pub fn net_change(&self) -> f64 {
        self.total_eroded - self.total_deposited
    }

    /// Average number of steps per droplet.
    pub fn mean_path_length(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.steps_taken as f64 / self.iterations as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_derived_values() {
        let stats = ErosionStats {
            iterations: 4,
            steps_taken: 10,
            total_eroded: 3.0,
            total_deposited: 1.0,
            ..Default::default()
        };
        assert_eq!(stats.net_change(), 2.0);
        assert_eq!(stats.mean_path_length(), 2.5);
        assert_eq!(ErosionStats::default().mean_path_length(), 0.0);
    }
}

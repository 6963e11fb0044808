//! Rescaling of noise fields into [0, 1] against their channel range.

use super::extrema::{ChannelExtrema, Extrema};
use crate::tilemap::Tilemap;

/// Value every cell takes when the channel range is empty or degenerate.
pub const DEGENERATE_VALUE: f32 = 0.0;

/// Inverse linear interpolation clamped to [0, 1].
///
/// Returns [`DEGENERATE_VALUE`] when `min >= max` instead of dividing by zero.
#[inline]
pub fn inverse_lerp(min: f32, max: f32, value: f32) -> f32 {
    if !(max > min) {
        return DEGENERATE_VALUE;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Normalize `field` in place against the tracked range of `channel`.
///
/// Must only run once every field of the channel has been generated for the
/// current pass; otherwise chunks are scaled against different ranges.
pub fn normalize_field(field: &mut Tilemap<f32>, channel: usize, extrema: &ChannelExtrema) {
    let Extrema { min, max } = extrema.read(channel);
    for (_, _, value) in field.iter_mut() {
        *value = inverse_lerp(min, max, *value);
    }
}

//! Per-channel running min/max accumulators.
//!
//! Every noise field belongs to a channel (height, humidity, ...). While the
//! fields of a generation pass are produced, each raw value is folded into its
//! channel's extrema so that all chunks of the pass can later be normalized
//! against the same range.

/// Number of independent channels tracked simultaneously.
pub const CHANNEL_COUNT: usize = 8;

/// Channel used for terrain height.
pub const HEIGHT_CHANNEL: usize = 0;

/// Channel used for humidity.
pub const HUMIDITY_CHANNEL: usize = 1;

/// Running range of one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extrema {
    pub min: f32,
    pub max: f32,
}

impl Extrema {
    /// The range before any value has been accumulated.
    pub const EMPTY: Self = Self { min: f32::MAX, max: f32::MIN };

    /// The range of a normalized field.
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn range(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max - self.min }
    }

    fn include(&mut self, value: f32) {
        if value > self.max { self.max = value; }
        if value < self.min { self.min = value; }
    }
}

impl Default for Extrema {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Owned table of channel extrema for one generation pass.
///
/// Must be reset at the start of each full-map regeneration, otherwise ranges
/// from a previous pass leak into normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelExtrema {
    channels: [Extrema; CHANNEL_COUNT],
}

impl ChannelExtrema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every accumulated range.
    pub fn reset(&mut self) {
        self.channels = [Extrema::EMPTY; CHANNEL_COUNT];
    }

    /// Fold `value` into the range of `channel`.
    ///
    /// # Panics
    /// If `channel >= CHANNEL_COUNT`.
    #[inline]
    pub fn accumulate(&mut self, channel: usize, value: f32) {
        self.channels[checked(channel)].include(value);
    }

    /// Current range of `channel`.
    pub fn read(&self, channel: usize) -> Extrema {
        self.channels[checked(channel)]
    }

    /// Overwrite the range of `channel`, e.g. after its fields were normalized.
    pub fn set(&mut self, channel: usize, extrema: Extrema) {
        self.channels[checked(channel)] = extrema;
    }
}

fn checked(channel: usize) -> usize {
    assert!(
        channel < CHANNEL_COUNT,
        "channel {channel} outside the {CHANNEL_COUNT}-entry channel table"
    );
    channel
}

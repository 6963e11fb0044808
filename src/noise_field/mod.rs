//! Noise field synthesis
//!
//! - **Field generation**: layered Perlin noise per chunk, offset-stable across chunks
//! - **Extrema**: per-channel running range shared by every chunk of a pass
//! - **Normalization**: inverse-lerp of each chunk against its channel range
//! - **Filters**: optional terracing of normalized height fields

pub mod extrema;
pub mod field;
pub mod filters;
pub mod normalize;

pub use extrema::{ChannelExtrema, Extrema, CHANNEL_COUNT, HEIGHT_CHANNEL, HUMIDITY_CHANNEL};
pub use field::{generate_noise_field, NoiseParams};
pub use filters::{CascadeFilter, CascadeMode};
pub use normalize::{inverse_lerp, normalize_field};

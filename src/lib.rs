//! Chunked procedural terrain generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod chunks;
pub mod config;
pub mod curve;
pub mod erosion;
pub mod error;
pub mod export;
pub mod logging;
pub mod mesh;
pub mod noise_field;
pub mod placement;
pub mod poisson;
pub mod regions;
pub mod tilemap;
pub mod world;

pub use config::TerrainConfig;
pub use error::TerrainError;
pub use world::{ChunkData, TerrainMap};

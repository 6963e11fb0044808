//! Error types for terrain generation.

use crate::chunks::ChunkCoord;

/// Errors that can occur while configuring, stitching or exporting terrain.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse or serialize JSON config content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] serde_json::Error),

    /// Stitching was asked to work on zero chunks.
    #[error("no chunks to stitch")]
    EmptyChunkSet,

    /// A chunk tile does not have the size the layout expects.
    #[error("chunk {coord} is {found:?}, layout expects {expected:?}")]
    TileSizeMismatch {
        coord: ChunkCoord,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// The shared field cannot hold every window requested by `split`.
    #[error("shared field {found:?} is smaller than required {required:?}")]
    SharedFieldTooSmall {
        required: (usize, usize),
        found: (usize, usize),
    },

    /// Writing a preview image failed.
    #[error("failed to export image: {0}")]
    ImageError(#[from] image::ImageError),
}

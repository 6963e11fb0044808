//! Chunk addressing and stitching.
//!
//! Each chunk tile occupies a window of the shared field. Windows of adjacent
//! chunks overlap by `3 * border_size` cells so that the outer ring of every
//! tile (used only for seam normals) holds real neighbour data.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::tilemap::Tilemap;

/// Border ring width, in cells, of every chunk tile.
pub const BORDER_SIZE: usize = 1;

/// Integer grid index of a chunk in the overall map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Tile geometry shared by every chunk of a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Tile width in cells (`chunk_size * lod`)
    pub tile_width: usize,
    /// Tile height in cells
    pub tile_height: usize,
    pub border_size: usize,
}

/// Placement of the coordinate set inside the shared field.
#[derive(Clone, Copy, Debug)]
struct SharedBounds {
    min_x: i32,
    min_z: i32,
    width: usize,
    height: usize,
}

impl ChunkLayout {
    /// # Panics
    /// If a tile is not larger than the overlap between neighbours.
    pub fn new(tile_width: usize, tile_height: usize, border_size: usize) -> Self {
        let layout = Self { tile_width, tile_height, border_size };
        assert!(
            tile_width > layout.overlap() && tile_height > layout.overlap(),
            "tile {tile_width}x{tile_height} too small for overlap {}",
            layout.overlap()
        );
        layout
    }

    /// Cells shared by two adjacent windows.
    pub fn overlap(&self) -> usize {
        3 * self.border_size
    }

    /// Distance in cells between the origins of adjacent windows.
    pub fn stride(&self) -> (usize, usize) {
        (self.tile_width - self.overlap(), self.tile_height - self.overlap())
    }

    /// World-space origin of a chunk for noise sampling, given the LOD factor.
    pub fn world_offset(&self, coord: ChunkCoord, lod: usize) -> [f32; 2] {
        let (sx, sz) = self.stride();
        let lod = lod.max(1) as f32;
        [coord.x as f32 * sx as f32 / lod, coord.z as f32 * sz as f32 / lod]
    }

    /// Size of the shared field covering `coords`, or `None` if empty.
    pub fn shared_size(&self, coords: &[ChunkCoord]) -> Option<(usize, usize)> {
        self.bounds(coords.iter().copied()).map(|b| (b.width, b.height))
    }

    fn bounds(&self, coords: impl Iterator<Item = ChunkCoord>) -> Option<SharedBounds> {
        let mut range: Option<(i32, i32, i32, i32)> = None;
        for c in coords {
            range = Some(match range {
                None => (c.x, c.z, c.x, c.z),
                Some((min_x, min_z, max_x, max_z)) => {
                    (min_x.min(c.x), min_z.min(c.z), max_x.max(c.x), max_z.max(c.z))
                }
            });
        }
        let (min_x, min_z, max_x, max_z) = range?;
        let (sx, sz) = self.stride();
        Some(SharedBounds {
            min_x,
            min_z,
            width: (max_x - min_x) as usize * sx + self.tile_width,
            height: (max_z - min_z) as usize * sz + self.tile_height,
        })
    }

    fn window_origin(&self, bounds: &SharedBounds, coord: ChunkCoord) -> (usize, usize) {
        let (sx, sz) = self.stride();
        ((coord.x - bounds.min_x) as usize * sx, (coord.z - bounds.min_z) as usize * sz)
    }

    /// Copy every tile into its window of a new shared field.
    ///
    /// Tiles are written in slice order, so where windows overlap the later
    /// tile wins. Callers that need reproducible results must pass tiles in a
    /// stable order.
    pub fn combine(&self, tiles: &[(ChunkCoord, &Tilemap<f32>)]) -> Result<Tilemap<f32>, TerrainError> {
        let bounds = self
            .bounds(tiles.iter().map(|(coord, _)| *coord))
            .ok_or(TerrainError::EmptyChunkSet)?;

        let mut shared = Tilemap::new_with(bounds.width, bounds.height, 0.0f32);
        for &(coord, tile) in tiles {
            if (tile.width, tile.height) != (self.tile_width, self.tile_height) {
                return Err(TerrainError::TileSizeMismatch {
                    coord,
                    expected: (self.tile_width, self.tile_height),
                    found: (tile.width, tile.height),
                });
            }

            let (ox, oz) = self.window_origin(&bounds, coord);
            for (x, y, &value) in tile.iter() {
                shared.set(ox + x, oz + y, value);
            }
        }

        Ok(shared)
    }

    /// Read the window of each coordinate back out of a shared field.
    ///
    /// `coords` must be the same set that was passed to [`combine`](Self::combine).
    pub fn split(&self, shared: &Tilemap<f32>, coords: &[ChunkCoord]) -> Result<Vec<Tilemap<f32>>, TerrainError> {
        let bounds = self
            .bounds(coords.iter().copied())
            .ok_or(TerrainError::EmptyChunkSet)?;
        if shared.width < bounds.width || shared.height < bounds.height {
            return Err(TerrainError::SharedFieldTooSmall {
                required: (bounds.width, bounds.height),
                found: (shared.width, shared.height),
            });
        }

        let tiles = coords
            .iter()
            .map(|&coord| {
                let (ox, oz) = self.window_origin(&bounds, coord);
                let mut tile = Tilemap::new_with(self.tile_width, self.tile_height, 0.0f32);
                for (x, y, value) in tile.iter_mut() {
                    *value = *shared.get(ox + x, oz + y);
                }
                tile
            })
            .collect();

        Ok(tiles)
    }
}

/// Insertion-ordered map from chunk coordinate to per-chunk data.
///
/// Iteration follows insertion order, which keeps stitching deterministic.
#[derive(Clone, Debug)]
pub struct ChunkTable<T> {
    entries: Vec<(ChunkCoord, T)>,
    index: HashMap<ChunkCoord, usize>,
}

impl<T> Default for ChunkTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ChunkTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `coord`. A replaced entry keeps its
    /// original position in the iteration order.
    pub fn insert(&mut self, coord: ChunkCoord, value: T) -> Option<T> {
        match self.index.get(&coord) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(coord, self.entries.len());
                self.entries.push((coord, value));
                None
            }
        }
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&T> {
        self.index.get(&coord).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut T> {
        self.index.get(&coord).map(|&i| &mut self.entries[i].1)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.index.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.entries.iter().map(|(coord, _)| *coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkCoord, &T)> {
        self.entries.iter().map(|(coord, value)| (*coord, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChunkCoord, &mut T)> {
        self.entries.iter_mut().map(|(coord, value)| (*coord, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_coords(nx: i32, nz: i32) -> Vec<ChunkCoord> {
        (0..nz).flat_map(|z| (0..nx).map(move |x| ChunkCoord::new(x, z))).collect()
    }

    #[test]
    fn test_round_trip_without_overlap() {
        let layout = ChunkLayout::new(6, 5, 0);
        let coords = grid_coords(3, 2);
        let tiles: Vec<Tilemap<f32>> = (0..coords.len())
            .map(|i| Tilemap::new_with(6, 5, i as f32 + 1.0))
            .collect();
        let pairs: Vec<(ChunkCoord, &Tilemap<f32>)> = coords.iter().copied().zip(tiles.iter()).collect();

        let shared = layout.combine(&pairs).unwrap();
        assert_eq!((shared.width, shared.height), (18, 10));

        let back = layout.split(&shared, &coords).unwrap();
        assert_eq!(back, tiles);
    }

    #[test]
    fn test_round_trip_with_consistent_overlap() {
        // Tiles cut from one global function agree on their overlaps.
        let layout = ChunkLayout::new(10, 10, BORDER_SIZE);
        let (sx, sz) = layout.stride();
        let coords = grid_coords(3, 3);
        let global = |x: usize, y: usize| (x * 31 + y * 7) as f32;
        let tiles: Vec<Tilemap<f32>> = coords
            .iter()
            .map(|c| {
                let mut tile = Tilemap::new_with(10, 10, 0.0f32);
                for (x, y, v) in tile.iter_mut() {
                    *v = global(c.x as usize * sx + x, c.z as usize * sz + y);
                }
                tile
            })
            .collect();
        let pairs: Vec<_> = coords.iter().copied().zip(tiles.iter()).collect();

        let shared = layout.combine(&pairs).unwrap();
        assert_eq!(shared.width, 2 * sx + 10);
        assert_eq!(*shared.get(20, 5), global(20, 5));
        assert_eq!(layout.split(&shared, &coords).unwrap(), tiles);
    }

    #[test]
    fn test_later_chunk_overwrites_overlap() {
        // Known order sensitivity: overlapping cells take the last tile's value.
        let layout = ChunkLayout::new(8, 8, BORDER_SIZE);
        let first = Tilemap::new_with(8, 8, 1.0f32);
        let second = Tilemap::new_with(8, 8, 2.0f32);
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(1, 0);

        let forward = layout.combine(&[(a, &first), (b, &second)]).unwrap();
        let reverse = layout.combine(&[(b, &second), (a, &first)]).unwrap();
        let overlap_x = layout.stride().0;

        assert_eq!(*forward.get(overlap_x, 3), 2.0);
        assert_eq!(*reverse.get(overlap_x, 3), 1.0);

        let split = layout.split(&forward, &[a, b]).unwrap();
        assert_eq!(*split[0].get(7, 3), 2.0);
        assert_eq!(*split[0].get(4, 3), 1.0);
        assert_eq!(split[1], second);
    }

    #[test]
    fn test_negative_coords_are_rebased() {
        let layout = ChunkLayout::new(4, 4, 0);
        let tile = Tilemap::new_with(4, 4, 3.0f32);
        let shared = layout.combine(&[(ChunkCoord::new(-1, -1), &tile)]).unwrap();
        assert_eq!((shared.width, shared.height), (4, 4));
    }

    #[test]
    fn test_shape_errors() {
        let layout = ChunkLayout::new(4, 4, 0);
        assert!(matches!(layout.combine(&[]), Err(TerrainError::EmptyChunkSet)));

        let wrong = Tilemap::new_with(3, 4, 0.0f32);
        let err = layout.combine(&[(ChunkCoord::new(0, 0), &wrong)]).unwrap_err();
        assert!(matches!(err, TerrainError::TileSizeMismatch { found: (3, 4), .. }));

        let small = Tilemap::new_with(4, 4, 0.0f32);
        let err = layout.split(&small, &[ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]).unwrap_err();
        assert!(matches!(err, TerrainError::SharedFieldTooSmall { .. }));
    }

    #[test]
    fn test_world_offset_matches_stride() {
        let layout = ChunkLayout::new(64, 64, BORDER_SIZE);
        let offset = layout.world_offset(ChunkCoord::new(2, 1), 2);
        assert_eq!(offset, [61.0, 30.5]);
    }

    #[test]
    fn test_table_keeps_insertion_order() {
        let mut table = ChunkTable::new();
        table.insert(ChunkCoord::new(2, 0), "c");
        table.insert(ChunkCoord::new(0, 0), "a");
        table.insert(ChunkCoord::new(1, 0), "b");
        assert_eq!(table.insert(ChunkCoord::new(0, 0), "a2"), Some("a"));

        let order: Vec<_> = table.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!["c", "a2", "b"]);
        assert!(table.contains(ChunkCoord::new(1, 0)));

        table.clear();
        assert!(table.is_empty());
        assert!(table.get(ChunkCoord::new(2, 0)).is_none());
    }
}

/// A dense 2D grid stored row-major. Used as the heightfield type for every
/// pipeline stage. Unlike a world map it never wraps: indices outside the grid
/// are a programming error.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    /// A `width x height` map with every cell set to `value`.
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        let data = vec![value; width * height];
        Self { width, height, data }
    }
}

impl<T> Tilemap<T> {
    /// Build a map from a row-major vector. Returns `None` when the length
    /// does not match `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "cell ({x}, {y}) outside {}x{}", self.width, self.height);
        x + y * self.width
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.offset(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let offset = self.offset(x, y);
        self.data[offset] = value;
    }

    /// Whether `(x, y)` lies on the outermost ring of cells.
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Cells as `(x, y, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.data
            .chunks(self.width.max(1))
            .enumerate()
            .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, v)| (x, y, v)))
    }

    /// Mutable cells as `(x, y, value)` in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        self.data
            .chunks_mut(self.width.max(1))
            .enumerate()
            .flat_map(|(y, row)| row.into_iter().enumerate().map(move |(x, v)| (x, y, v)))
    }
}

impl Tilemap<f32> {
    /// Smallest and largest cell values, or `None` for an empty map.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.data.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v))))
    }

    /// Sample using bilinear interpolation. Coordinates are clamped to the grid.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let h00 = *self.get(x0, y0);
        let h10 = *self.get(x1, y0);
        let h01 = *self.get(x0, y1);
        let h11 = *self.get(x1, y1);

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;
        h0 * (1.0 - fy) + h1 * fy
    }
}

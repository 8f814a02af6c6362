//! Axis-aligned pixel rectangle with inclusive bounds.

/// Axis-aligned bounding box with `usize` coordinates.
///
/// A pixel at (x, y) is inside if `x_min <= x <= x_max` and
/// `y_min <= y <= y_max`, so a box seeded at one cell is 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl Aabb {
    #[inline]
    pub const fn new(x_min: usize, x_max: usize, y_min: usize, y_max: usize) -> Self {
        assert!(x_min <= x_max && y_min <= y_max, "inverted bounds");
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// A 1x1 box covering a single cell.
    #[inline]
    pub const fn seed(x: usize, y: usize) -> Self {
        Self::new(x, x, y, y)
    }

    /// Grows the box so it covers `(x, y)`. Bounds only ever widen.
    #[inline]
    pub fn include(&mut self, x: usize, y: usize) {
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    /// Number of columns.
    #[inline]
    pub const fn width(&self) -> usize {
        self.x_max - self.x_min + 1
    }

    /// Number of rows.
    #[inline]
    pub const fn height(&self) -> usize {
        self.y_max - self.y_min + 1
    }

    #[cfg(test)]
    pub(crate) const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::slice;

/// Row-major 2-D grid addressed as `(x, y)`: `x` is the column, `y` the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Builds a buffer by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.width;
        &mut self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.pixels.iter()
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Same shape as `other`.
    #[inline]
    pub fn same_shape<U>(&self, other: &Buffer2<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, T::default())
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    /// Copies the `width x height` region whose top-left cell is `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Self {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "crop region {}x{} at ({}, {}) exceeds {}x{} buffer",
            width,
            height,
            x,
            y,
            self.width,
            self.height
        );
        let mut pixels = Vec::with_capacity(width * height);
        for row in y..y + height {
            let start = row * self.width + x;
            pixels.extend_from_slice(&self.pixels[start..start + width]);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Mirrors the buffer left to right.
    pub fn flip_horizontal(&self) -> Self {
        let mut flipped = self.clone();
        for y in 0..self.height {
            flipped.row_mut(y).reverse();
        }
        flipped
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl<T> DerefMut for Buffer2<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}

impl<'a, T> IntoIterator for &'a Buffer2<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.len(), 6);
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn test_new_panics_on_size_mismatch() {
        Buffer2::new(3, 2, vec![1, 2, 3]);
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let buf = Buffer2::from_fn(3, 2, |x, y| (y * 10 + x) as u8);
        assert_eq!(buf.pixels(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(buf[(2, 1)], 12);
    }

    #[test]
    fn test_new_default_and_filled() {
        let zeros: Buffer2<u8> = Buffer2::new_default(4, 3);
        assert!(zeros.iter().all(|&v| v == 0));
        let filled = Buffer2::new_filled(2, 3, true);
        assert_eq!(filled.len(), 6);
        assert!(filled.iter().all(|&v| v));
    }

    #[test]
    fn test_rows() {
        let mut buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.row(1), &[40, 50, 60]);
        buf.row_mut(0)[2] = 99;
        assert_eq!(buf[(2, 0)], 99);
        assert_eq!(buf.index(2, 1), 5);
    }

    #[test]
    fn test_crop() {
        // 4x3: row y holds 10*y + x
        let buf = Buffer2::from_fn(4, 3, |x, y| 10 * y + x);
        let cropped = buf.crop(1, 1, 2, 2);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.pixels(), &[11, 12, 21, 22]);

        let full = buf.crop(0, 0, 4, 3);
        assert_eq!(full, buf);
    }

    #[test]
    fn test_crop_empty_region() {
        let buf = Buffer2::from_fn(4, 3, |x, y| 10 * y + x);
        let empty = buf.crop(4, 0, 0, 3);
        assert_eq!(empty.width(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    #[should_panic(expected = "exceeds 4x3 buffer")]
    fn test_crop_out_of_bounds() {
        let buf = Buffer2::from_fn(4, 3, |x, y| 10 * y + x);
        buf.crop(3, 0, 2, 1);
    }

    #[test]
    fn test_flip_horizontal() {
        let buf = Buffer2::new(3, 2, vec![1, 2, 3, 4, 5, 6]);
        let flipped = buf.flip_horizontal();
        assert_eq!(flipped.pixels(), &[3, 2, 1, 6, 5, 4]);
        assert_eq!(flipped.flip_horizontal(), buf);
    }

    #[test]
    fn test_map_keeps_shape() {
        let buf = Buffer2::new(2, 2, vec![0u8, 3, 0, 7]);
        let mask = buf.map(|&v| v != 0);
        assert!(mask.same_shape(&buf));
        assert_eq!(mask.pixels(), &[false, true, false, true]);
    }
}

//! Rotation and mirroring of 8-bit rasters.
//!
//! Rotations are counter-clockwise as seen on screen (y pointing down) about
//! the image center, onto a canvas expanded to hold the whole rotated image:
//!
//! ```text
//! W' = |cos θ| w + |sin θ| h
//! H' = |sin θ| w + |cos θ| h
//! ```
//!
//! Cells of the expanded canvas not covered by the source are zero. Pixel
//! centers sit at integer coordinates, so the center of a `w x h` image is
//! `((w - 1) / 2, (h - 1) / 2)` and quarter turns are exact.


use glam::DVec2;

use crate::raster::GrayImage;

/// Slack added before truncating canvas sizes, so `99.9999999` becomes 100.
const EXTENT_SLACK: f64 = 1e-9;

/// Resampling used by [`rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Copies the closest source cell. Keeps label ids intact.
    Nearest,
    /// Weighted average of the four surrounding cells. For intensities.
    #[default]
    Bilinear,
}

/// Rigid rotation of a `width x height` grid onto its expanded canvas.
#[derive(Debug, Clone, Copy)]
pub struct Rotation {
    cos: f64,
    sin: f64,
    source_center: DVec2,
    output_center: DVec2,
    output_width: usize,
    output_height: usize,
}

impl Rotation {
    pub fn new(angle_degrees: f64, width: usize, height: usize) -> Self {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let (output_width, output_height) = expanded_size(cos, sin, width, height);
        Self {
            cos,
            sin,
            source_center: center_of(width, height),
            output_center: center_of(output_width, output_height),
            output_width,
            output_height,
        }
    }

    #[inline]
    pub fn output_size(&self) -> (usize, usize) {
        (self.output_width, self.output_height)
    }

    /// Maps a source coordinate into the rotated canvas.
    #[cfg(test)]
    pub(crate) fn apply(&self, p: DVec2) -> DVec2 {
        let d = p - self.source_center;
        DVec2::new(
            self.cos * d.x + self.sin * d.y,
            -self.sin * d.x + self.cos * d.y,
        ) + self.output_center
    }

    /// Maps a rotated-canvas coordinate back into the source.
    #[inline]
    pub fn inverse(&self, q: DVec2) -> DVec2 {
        let d = q - self.output_center;
        DVec2::new(
            self.cos * d.x - self.sin * d.y,
            self.sin * d.x + self.cos * d.y,
        ) + self.source_center
    }
}

#[inline]
fn center_of(width: usize, height: usize) -> DVec2 {
    DVec2::new(
        (width as f64 - 1.0) * 0.5,
        (height as f64 - 1.0) * 0.5,
    )
}

fn expanded_size(cos: f64, sin: f64, width: usize, height: usize) -> (usize, usize) {
    let (w, h) = (width as f64, height as f64);
    let (cos, sin) = (cos.abs(), sin.abs());
    (
        (cos * w + sin * h + EXTENT_SLACK) as usize,
        (sin * w + cos * h + EXTENT_SLACK) as usize,
    )
}

/// Size of the canvas a `width x height` image occupies after rotating by
/// `angle_degrees`.
pub fn rotated_extent(width: usize, height: usize, angle_degrees: f64) -> (usize, usize) {
    Rotation::new(angle_degrees, width, height).output_size()
}

/// Rotates `image` counter-clockwise by `angle_degrees` into a new buffer.
pub fn rotate(image: &GrayImage, angle_degrees: f64, interpolation: Interpolation) -> GrayImage {
    if image.is_empty() {
        return image.clone();
    }

    let rotation = Rotation::new(angle_degrees, image.width(), image.height());
    let (width, height) = rotation.output_size();

    GrayImage::from_fn(width, height, |x, y| {
        let p = rotation.inverse(DVec2::new(x as f64, y as f64));
        match interpolation {
            Interpolation::Nearest => sample_nearest(image, p.x, p.y),
            Interpolation::Bilinear => sample_bilinear(image, p.x, p.y).round() as u8,
        }
    })
}

#[inline]
fn sample_pixel(image: &GrayImage, x: i64, y: i64) -> f64 {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        0.0
    } else {
        image[(x as usize, y as usize)] as f64
    }
}

#[inline]
fn sample_nearest(image: &GrayImage, x: f64, y: f64) -> u8 {
    sample_pixel(image, x.round() as i64, y.round() as i64) as u8
}

/// Bilinear sample at a fractional position, zero outside the image.
pub(crate) fn sample_bilinear(image: &GrayImage, x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = sample_pixel(image, x0, y0);
    let p10 = sample_pixel(image, x0 + 1, y0);
    let p01 = sample_pixel(image, x0, y0 + 1);
    let p11 = sample_pixel(image, x0 + 1, y0 + 1);

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    top + fy * (bottom - top)
}

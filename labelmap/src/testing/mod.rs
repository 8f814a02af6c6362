//! Synthetic images for tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::raster::{GrayImage, LabelMask};

const BLUR_RADIUS: usize = 3;

/// Seeded random texture with a few pixels of spatial correlation and the
/// full 0..=255 range. Templates cut from it have one clear match.
pub fn smooth_texture(width: usize, height: usize, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values: Vec<f64> = (0..width * height)
        .map(|_| rng.random_range(0.0..255.0))
        .collect();

    for _ in 0..2 {
        values = box_blur(&values, width, height, BLUR_RADIUS);
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = if max > min { 255.0 / (max - min) } else { 0.0 };

    GrayImage::new(
        width,
        height,
        values
            .iter()
            .map(|&v| ((v - min) * scale).round() as u8)
            .collect(),
    )
}

/// Separable mean filter, windows clipped at the borders.
fn box_blur(values: &[f64], width: usize, height: usize, radius: usize) -> Vec<f64> {
    let mut horizontal = vec![0.0; values.len()];
    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let row = &values[y * width..(y + 1) * width];
            horizontal[y * width + x] = row[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64;
        }
    }

    let mut out = vec![0.0; values.len()];
    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        for x in 0..width {
            let sum: f64 = (lo..=hi).map(|yy| horizontal[yy * width + x]).sum();
            out[y * width + x] = sum / (hi - lo + 1) as f64;
        }
    }
    out
}

/// Copies all of `src` into `dst` with its top-left at `(x, y)`.
pub fn paste(dst: &mut GrayImage, src: &GrayImage, x: usize, y: usize) {
    for sy in 0..src.height() {
        dst.row_mut(y + sy)[x..x + src.width()].copy_from_slice(src.row(sy));
    }
}

/// Sets the `width x height` rectangle at `(x, y)` to `value`.
pub fn fill_rect(mask: &mut LabelMask, x: usize, y: usize, width: usize, height: usize, value: u8) {
    for yy in y..y + height {
        for xx in x..x + width {
            mask[(xx, yy)] = value;
        }
    }
}

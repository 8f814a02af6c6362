//! 8-bit rasters: file I/O, shape validation and small whole-image helpers.

mod error;
mod io;
mod shape;

pub use error::ImageLoadError;
pub use io::{load_gray, save_gray};
pub use shape::{LABEL_TILE, ShapeCheck, ShapeError, check_shapes, conform_labels};

use common::Buffer2;

/// Grayscale intensities.
pub type GrayImage = Buffer2<u8>;

/// Label ids, 0 is background.
pub type LabelMask = Buffer2<u8>;

/// Centers `image` on a zero square canvas whose side is the image diagonal,
/// `floor(sqrt(w² + h²))`.
pub fn pad_to_square(image: &GrayImage) -> GrayImage {
    let (w, h) = (image.width(), image.height());
    let side = ((w * w + h * h) as f64).sqrt() as usize;
    let x0 = (side - w) / 2;
    let y0 = (side - h) / 2;

    let mut padded = GrayImage::new_default(side, side);
    for y in 0..h {
        padded.row_mut(y0 + y)[x0..x0 + w].copy_from_slice(image.row(y));
    }
    padded
}

/// Copy of `large` with every pixel at or above its label value set to zero.
///
/// # Panics
///
/// Panics if the two rasters differ in shape.
pub fn diagnostic_overlay(large: &GrayImage, labels: &LabelMask) -> GrayImage {
    assert!(
        large.same_shape(labels),
        "labels {}x{} do not match image {}x{}",
        labels.width(),
        labels.height(),
        large.width(),
        large.height()
    );
    GrayImage::new(
        large.width(),
        large.height(),
        large
            .iter()
            .zip(labels.iter())
            .map(|(&v, &label)| if v >= label { 0 } else { v })
            .collect(),
    )
}

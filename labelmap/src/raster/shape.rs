//! Input shape compatibility between the small image, its labels and the
//! large image.

use thiserror::Error;

use super::{GrayImage, LabelMask};

/// Label rasters exported in tiles may be padded up to a multiple of this.
pub const LABEL_TILE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error(
        "small image {small_width}x{small_height} is larger than large image {large_width}x{large_height}"
    )]
    SmallExceedsLarge {
        small_width: usize,
        small_height: usize,
        large_width: usize,
        large_height: usize,
    },

    #[error(
        "label raster {label_width}x{label_height} does not match small image {small_width}x{small_height}"
    )]
    LabelMismatch {
        label_width: usize,
        label_height: usize,
        small_width: usize,
        small_height: usize,
    },
}

/// How the label raster relates to the small image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeCheck {
    /// Same size as the small image.
    Matching,
    /// Tile-padded; crop to the small image's extent.
    CropLabels,
}

impl ShapeCheck {
    /// Brings `labels` to the small image's size.
    pub fn apply(self, labels: LabelMask, small: &GrayImage) -> LabelMask {
        match self {
            ShapeCheck::Matching => labels,
            ShapeCheck::CropLabels => labels.crop(0, 0, small.width(), small.height()),
        }
    }
}

/// Validates the three inputs before any search runs.
pub fn check_shapes(
    small: &GrayImage,
    labels: &LabelMask,
    large: &GrayImage,
) -> Result<ShapeCheck, ShapeError> {
    if small.width() * small.height() > large.width() * large.height() {
        return Err(ShapeError::SmallExceedsLarge {
            small_width: small.width(),
            small_height: small.height(),
            large_width: large.width(),
            large_height: large.height(),
        });
    }

    if labels.same_shape(small) {
        return Ok(ShapeCheck::Matching);
    }

    let tiled = labels.width() % LABEL_TILE == 0 && labels.height() % LABEL_TILE == 0;
    let covers = labels.width() >= small.width() && labels.height() >= small.height();
    if tiled && covers {
        Ok(ShapeCheck::CropLabels)
    } else {
        Err(ShapeError::LabelMismatch {
            label_width: labels.width(),
            label_height: labels.height(),
            small_width: small.width(),
            small_height: small.height(),
        })
    }
}

/// [`check_shapes`] followed by [`ShapeCheck::apply`].
pub fn conform_labels(
    small: &GrayImage,
    labels: LabelMask,
    large: &GrayImage,
) -> Result<LabelMask, ShapeError> {
    let check = check_shapes(small, &labels, large)?;
    Ok(check.apply(labels, small))
}

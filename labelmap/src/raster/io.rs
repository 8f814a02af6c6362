//! Reading and writing 8-bit grayscale rasters.
//!
//! Any layout the `image` crate decodes is accepted. Color is averaged over
//! the RGB channels (alpha ignored). 16-bit samples are either rescaled
//! linearly (`v * 255 / 65535`) or saturated at 255.

use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma};
use log::debug;

use super::{GrayImage, ImageLoadError};

/// Loads `path` as an 8-bit grayscale image.
///
/// With `rescale_wide`, 16-bit sources are scaled into 0..=255; without it
/// their values are kept and saturated, which suits label rasters whose ids
/// are small integers.
pub fn load_gray(path: &Path, rescale_wide: bool) -> Result<GrayImage, ImageLoadError> {
    let dynamic = image::open(path).map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let width = dynamic.width() as usize;
    let height = dynamic.height() as usize;
    let narrow = |v: u16| narrow_sample(v, rescale_wide);

    let pixels: Vec<u8> = match &dynamic {
        DynamicImage::ImageLuma8(gray) => gray.as_raw().clone(),
        DynamicImage::ImageLuma16(gray) => gray.as_raw().iter().map(|&v| narrow(v)).collect(),
        DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => dynamic
            .to_rgb16()
            .pixels()
            .map(|p| narrow(average_u16(p.0)))
            .collect(),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
            dynamic.to_rgb8().pixels().map(|p| average_u8(p.0)).collect()
        }
        _ => dynamic.to_luma8().into_raw(),
    };

    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        width,
        height,
        dynamic.color()
    );
    Ok(GrayImage::new(width, height, pixels))
}

#[inline]
fn narrow_sample(v: u16, rescale: bool) -> u8 {
    if rescale {
        (v as f64 * 255.0 / 65535.0).round() as u8
    } else {
        v.min(255) as u8
    }
}

#[inline]
fn average_u8(rgb: [u8; 3]) -> u8 {
    let sum: u32 = rgb.iter().map(|&c| c as u32).sum();
    ((sum as f64) / 3.0).round() as u8
}

#[inline]
fn average_u16(rgb: [u16; 3]) -> u16 {
    let sum: u32 = rgb.iter().map(|&c| c as u32).sum();
    ((sum as f64) / 3.0).round() as u16
}

/// Writes `image` to `path`, creating parent directories. The format
/// follows the file extension.
pub fn save_gray(path: &Path, image: &GrayImage) -> Result<(), ImageLoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ImageLoadError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let too_large = || ImageLoadError::TooLarge {
        path: path.to_path_buf(),
        width: image.width(),
        height: image.height(),
    };
    let width = u32::try_from(image.width()).map_err(|_| too_large())?;
    let height = u32::try_from(image.height()).map_err(|_| too_large())?;
    let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, image.pixels().to_vec()).ok_or_else(too_large)?;

    buffer.save(path).map_err(|source| ImageLoadError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

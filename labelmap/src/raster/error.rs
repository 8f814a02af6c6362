use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or writing a raster file.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("Failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to encode image '{path}': {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Image '{path}' of {width}x{height} exceeds the encoder's size limit")]
    TooLarge {
        path: PathBuf,
        width: usize,
        height: usize,
    },
}

use std::path::PathBuf;

use thiserror::Error;

use crate::estimator::EstimateError;
use crate::raster::{ImageLoadError, ShapeError};

/// Errors of the label mapping workflow.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Required input '{path}' could not be found")]
    MissingInput { path: PathBuf },

    #[error(transparent)]
    Image(#[from] ImageLoadError),

    #[error("Incompatible input shapes: {0}")]
    Shape(#[from] ShapeError),

    #[error("No images have been mounted")]
    NotMounted,

    #[error("The images have not been oriented")]
    NotOriented,

    #[error("Orientation search failed: {0}")]
    Estimate(#[from] EstimateError),
}

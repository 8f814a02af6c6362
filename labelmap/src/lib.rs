//! Labelmap - transfers pixel labels from an image fragment to a larger image.
//!
//! A small grayscale fragment with an aligned label mask is located inside a
//! large image that shows the same surface at an unknown rotation, possibly
//! mirrored. The labels are rotated and pasted into the large image's frame:
//! - Template matching over rotation hypotheses with several similarity metrics
//! - Coarse-to-fine angle search decided by a majority vote of the metrics
//! - Per-cluster refinement of the global placement
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use labelmap::{LabelPipeline, load_gray, save_gray};
//!
//! let large = load_gray(Path::new("large.tif"), true)?;
//! let small = load_gray(Path::new("small.tif"), true)?;
//! let labels = load_gray(Path::new("small_inklabels.png"), false)?;
//!
//! let result = LabelPipeline::default().run(&large, &small, &labels)?;
//! save_gray(Path::new("large_inklabels.png"), &result.labels)?;
//! ```

pub mod config;
pub mod correlation;
mod error;
pub mod estimator;
pub mod mapper;
pub mod math;
pub mod matcher;
pub mod pipeline;
pub mod projector;
pub mod raster;
pub mod segment;
pub mod warp;

#[cfg(test)]
mod testing;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{ConfigError, PipelineConfig, SearchConfig, SegmentConfig, TemplateSize};

// ============================================================================
// Images
// ============================================================================

pub use raster::{
    GrayImage, ImageLoadError, LabelMask, ShapeError, conform_labels, diagnostic_overlay,
    load_gray, save_gray,
};

// ============================================================================
// Search and mapping
// ============================================================================

pub use error::MapError;
pub use estimator::{EstimateError, OrientationEstimate, OrientationEstimator};
pub use mapper::Mapper;
pub use matcher::{MatchCandidate, MatchMethod, Matcher};
pub use pipeline::{
    ClusterOutcome, ClusterProgress, LabelPipeline, PipelineResult, require_inputs,
};
pub use segment::Cluster;

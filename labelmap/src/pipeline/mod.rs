//! Two-stage label transfer from a small fragment into a large image.
//!
//! # Stages
//!
//! 1. **Global** - One orientation search of the whole small image against
//!    the whole large image (full circle, mirroring allowed).
//! 2. **Per cluster** - The small image and its labels are brought into the
//!    globally found orientation and segmented into clusters. Each cluster is
//!    searched again in a narrow angle range, inside a window of the large
//!    image around where stage 1 put it, and its labels are merged into the
//!    output canvas.
//!
//! Clusters whose local search cannot run (for example a window smaller than
//! the template) are skipped with a warning.


use std::path::Path;

use common::file_utils::first_missing_file;
use glam::IVec2;
use log::{info, warn};

use crate::config::PipelineConfig;
use crate::error::MapError;
use crate::estimator::{OrientationEstimate, OrientationEstimator};
use crate::mapper::Mapper;
use crate::math::Aabb;
use crate::raster::{GrayImage, LabelMask, conform_labels, pad_to_square};
use crate::segment::{Cluster, segment};
use crate::warp::{Interpolation, rotate};

/// Fails with [`MapError::MissingInput`] naming the first path that is not
/// an existing file.
pub fn require_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<(), MapError> {
    match first_missing_file(paths) {
        Some(path) => Err(MapError::MissingInput {
            path: path.to_path_buf(),
        }),
        None => Ok(()),
    }
}

/// What happened to one cluster in stage 2.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOutcome {
    /// Bounds in the globally oriented small image.
    pub bounds: Aabb,
    /// Search window in the large image, `None` if the cluster projected
    /// entirely outside it.
    pub window: Option<Aabb>,
    /// Local orientation relative to the global one, `None` if skipped.
    pub estimate: Option<OrientationEstimate>,
    /// Where the cluster's clipped labels landed in the output.
    pub placed_at: Option<IVec2>,
}

impl ClusterOutcome {
    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.placed_at.is_some()
    }
}

/// Passed to the sink after every cluster.
#[derive(Debug)]
pub struct ClusterProgress<'a> {
    /// Zero-based cluster index.
    pub index: usize,
    pub total: usize,
    pub outcome: &'a ClusterOutcome,
    /// Output labels so far.
    pub labels: &'a LabelMask,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Labels in the large image's frame and shape.
    pub labels: LabelMask,
    /// Stage 1 orientation of the (optionally padded) small image.
    pub global: OrientationEstimate,
    pub clusters: Vec<ClusterOutcome>,
}

/// Runs the two-stage search with a fixed configuration.
#[derive(Debug, Clone)]
pub struct LabelPipeline {
    config: PipelineConfig,
}

impl Default for LabelPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl LabelPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        config.validate();
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Maps `labels` of `small` into the frame of `large`.
    pub fn run(
        &self,
        large: &GrayImage,
        small: &GrayImage,
        labels: &LabelMask,
    ) -> Result<PipelineResult, MapError> {
        self.run_with_sink(large, small, labels, |_| Ok(()))
    }

    /// Like [`run`](Self::run), handing the output to `sink` after every
    /// cluster. An error from the sink aborts the run.
    pub fn run_with_sink<F>(
        &self,
        large: &GrayImage,
        small: &GrayImage,
        labels: &LabelMask,
        mut sink: F,
    ) -> Result<PipelineResult, MapError>
    where
        F: FnMut(&ClusterProgress<'_>) -> Result<(), MapError>,
    {
        let config = &self.config;
        let labels = conform_labels(small, labels.clone(), large)?;
        let (small, labels) = if config.pad_small_to_square {
            (pad_to_square(small), pad_to_square(&labels))
        } else {
            (small.clone(), labels)
        };
        let estimator = OrientationEstimator::new(&config.methods, config.template);

        // Stage 1
        info!(
            "Global search: {}x{} fragment in {}x{} image",
            small.width(),
            small.height(),
            large.width(),
            large.height()
        );
        let mut mapper = Mapper::new(estimator.clone());
        mapper.mount_images(large, &small, &labels);
        let global = mapper.orient_images(&config.global)?.clone();

        // Stage 2
        let (oriented_small, oriented_labels) = orient(&small, &labels, &global);
        let clusters = segment(&oriented_labels, &oriented_small, &config.segment);
        info!("Mapping {} clusters", clusters.len());

        let mut canvas = LabelMask::new_default(large.width(), large.height());
        let mut outcomes = Vec::with_capacity(clusters.len());
        for (index, cluster) in clusters.iter().enumerate() {
            let outcome = self.map_cluster(large, cluster, &global, &estimator, &mut canvas)?;
            info!(
                "Cluster {}/{}: {}",
                index + 1,
                clusters.len(),
                match &outcome.estimate {
                    Some(local) => format!(
                        "{:.3} degrees, origin ({}, {})",
                        local.angle, local.origin.x, local.origin.y
                    ),
                    None => "skipped".to_string(),
                }
            );

            sink(&ClusterProgress {
                index,
                total: clusters.len(),
                outcome: &outcome,
                labels: &canvas,
            })?;
            outcomes.push(outcome);
        }

        Ok(PipelineResult {
            labels: canvas,
            global,
            clusters: outcomes,
        })
    }

    fn map_cluster(
        &self,
        large: &GrayImage,
        cluster: &Cluster,
        global: &OrientationEstimate,
        estimator: &OrientationEstimator,
        canvas: &mut LabelMask,
    ) -> Result<ClusterOutcome, MapError> {
        let mut outcome = ClusterOutcome {
            bounds: cluster.bounds,
            window: None,
            estimate: None,
            placed_at: None,
        };

        let projected = global.origin + cluster.origin();
        let Some(window) = search_window(
            projected,
            cluster.width(),
            cluster.height(),
            self.config.window_margin,
            large.width(),
            large.height(),
        ) else {
            warn!(
                "Cluster at ({}, {}) projects outside the large image, skipping",
                cluster.bounds.x_min, cluster.bounds.y_min
            );
            return Ok(outcome);
        };
        outcome.window = Some(window);

        let window_image = large.crop(window.x_min, window.y_min, window.width(), window.height());
        let mut mapper = Mapper::new(estimator.clone());
        mapper.mount_images(&window_image, &cluster.contents, &cluster.mask);

        match mapper.orient_images(&self.config.local) {
            Ok(_) => {}
            Err(MapError::Estimate(err)) => {
                warn!(
                    "Cluster at ({}, {}) skipped: {}",
                    cluster.bounds.x_min, cluster.bounds.y_min, err
                );
                return Ok(outcome);
            }
            Err(err) => return Err(err),
        }

        let window_origin = IVec2::new(window.x_min as i32, window.y_min as i32);
        outcome.placed_at = mapper.map_labels(canvas, window_origin)?;
        outcome.estimate = mapper.estimate().cloned();
        Ok(outcome)
    }
}

/// Applies the global rotation and mirror to the small image (bilinear) and
/// its labels (nearest, ids preserved).
fn orient(
    small: &GrayImage,
    labels: &LabelMask,
    global: &OrientationEstimate,
) -> (GrayImage, LabelMask) {
    let mut image = rotate(small, global.angle, Interpolation::Bilinear);
    let mut labels = rotate(labels, global.angle, Interpolation::Nearest);
    if global.flipped {
        image = image.flip_horizontal();
        labels = labels.flip_horizontal();
    }
    (image, labels)
}

/// The `width x height` box at `projected` grown by `margin` on every side and
/// clamped to a `limit_width x limit_height` image. `None` if nothing is left.
pub fn search_window(
    projected: IVec2,
    width: usize,
    height: usize,
    margin: usize,
    limit_width: usize,
    limit_height: usize,
) -> Option<Aabb> {
    let (x_min, x_max) = clamp_span(projected.x as i64, width, margin, limit_width)?;
    let (y_min, y_max) = clamp_span(projected.y as i64, height, margin, limit_height)?;
    Some(Aabb::new(x_min, x_max, y_min, y_max))
}

/// Inclusive `[start - margin, start + len - 1 + margin]` clamped to `[0, limit)`.
fn clamp_span(start: i64, len: usize, margin: usize, limit: usize) -> Option<(usize, usize)> {
    let lo = (start - margin as i64).max(0);
    let hi = (start + len as i64 - 1 + margin as i64).min(limit as i64 - 1);
    (len > 0 && lo <= hi).then_some((lo as usize, hi as usize))
}

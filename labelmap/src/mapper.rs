//! Stateful mount, orient, map sequence for one source fragment.
//!
//! A [`Mapper`] borrows a source image, its labels and a destination, finds
//! the orientation of the source inside the destination and pastes the
//! correspondingly rotated labels into a canvas. Calling the steps out of
//! order is reported and the step is skipped.

use glam::IVec2;
use log::error;

use crate::config::SearchConfig;
use crate::error::MapError;
use crate::estimator::{OrientationEstimate, OrientationEstimator};
use crate::projector::project_into;
use crate::raster::{GrayImage, LabelMask};
use crate::warp::{Interpolation, rotate};

#[derive(Debug, Clone, Copy)]
struct Mounted<'a> {
    destination: &'a GrayImage,
    source: &'a GrayImage,
    labels: &'a LabelMask,
}

#[derive(Debug)]
pub struct Mapper<'a> {
    estimator: OrientationEstimator,
    mounted: Option<Mounted<'a>>,
    estimate: Option<OrientationEstimate>,
}

impl<'a> Mapper<'a> {
    pub fn new(estimator: OrientationEstimator) -> Self {
        Self {
            estimator,
            mounted: None,
            estimate: None,
        }
    }

    /// Mounts a new set of images and forgets any previous orientation.
    ///
    /// # Panics
    ///
    /// Panics if `labels` and `source` differ in shape.
    pub fn mount_images(
        &mut self,
        destination: &'a GrayImage,
        source: &'a GrayImage,
        labels: &'a LabelMask,
    ) {
        assert!(
            labels.same_shape(source),
            "labels {}x{} do not match source {}x{}",
            labels.width(),
            labels.height(),
            source.width(),
            source.height()
        );
        self.mounted = Some(Mounted {
            destination,
            source,
            labels,
        });
        self.estimate = None;
    }

    #[inline]
    pub fn estimate(&self) -> Option<&OrientationEstimate> {
        self.estimate.as_ref()
    }

    /// Searches for the orientation of the mounted source in the destination.
    pub fn orient_images(&mut self, search: &SearchConfig) -> Result<&OrientationEstimate, MapError> {
        let Some(mounted) = self.mounted else {
            error!("Cannot orient: no images have been mounted");
            return Err(MapError::NotMounted);
        };

        let estimate = self
            .estimator
            .estimate(mounted.source, mounted.destination, search)?;
        Ok(self.estimate.insert(estimate))
    }

    /// Rotates and mirrors the mounted labels by the found orientation and
    /// merges them into `canvas`, whose top-left sits at `offset` in the
    /// destination's frame.
    ///
    /// Returns where the clipped labels landed in `canvas`, or `None` if they
    /// missed it.
    pub fn map_labels(&self, canvas: &mut LabelMask, offset: IVec2) -> Result<Option<IVec2>, MapError> {
        let (Some(mounted), Some(estimate)) = (self.mounted, self.estimate.as_ref()) else {
            error!("Cannot map labels: the images have not been oriented");
            return Err(MapError::NotOriented);
        };

        let mut labels = rotate(mounted.labels, estimate.angle, Interpolation::Nearest);
        if estimate.flipped {
            labels = labels.flip_horizontal();
        }
        Ok(project_into(canvas, &labels, offset + estimate.origin))
    }
}

//! Connected-component extraction from label masks.
//!
//! Foreground cells (nonzero labels) are grouped by 4-connected breadth-first
//! flood fill in row-major discovery order. Components too small in either
//! direction are dropped as noise; components wider than the configured strip
//! width are cut into left-to-right strips.

#[cfg(test)]
mod tests;

use std::collections::VecDeque;

use common::Buffer2;
use glam::IVec2;

use crate::config::SegmentConfig;
use crate::math::Aabb;
use crate::raster::{GrayImage, LabelMask};

/// One letter-sized region of a label mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Inclusive bounds in the segmented mask's frame.
    pub bounds: Aabb,
    /// Image pixels under `bounds`.
    pub contents: GrayImage,
    /// Label ids of the component's cells under `bounds`, zero elsewhere.
    pub mask: LabelMask,
}

impl Cluster {
    /// Top-left corner in the segmented mask's frame.
    #[inline]
    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.bounds.x_min as i32, self.bounds.y_min as i32)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.bounds.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.bounds.height()
    }

    /// Columns `[x, x + width)` of this cluster, same rows.
    fn columns(&self, x: usize, width: usize) -> Cluster {
        let height = self.height();
        Cluster {
            bounds: Aabb::new(
                self.bounds.x_min + x,
                self.bounds.x_min + x + width - 1,
                self.bounds.y_min,
                self.bounds.y_max,
            ),
            contents: self.contents.crop(x, 0, width, height),
            mask: self.mask.crop(x, 0, width, height),
        }
    }
}

/// Splits `labels` into clusters, cropping contents from `image`.
///
/// # Panics
///
/// Panics if `labels` and `image` differ in shape.
pub fn segment(labels: &LabelMask, image: &GrayImage, config: &SegmentConfig) -> Vec<Cluster> {
    config.validate();
    assert!(
        labels.same_shape(image),
        "label mask {}x{} does not match image {}x{}",
        labels.width(),
        labels.height(),
        image.width(),
        image.height()
    );

    let mut remaining = labels.map(|&v| v != 0);
    let mut cursor = 0;
    let mut clusters = Vec::new();

    while let Some(seed) = next_seed(&remaining, &mut cursor) {
        let (bounds, cells) = flood_fill(&mut remaining, seed);
        if !exceeds_noise(&bounds, config.min_extent) {
            continue;
        }

        let mut mask = LabelMask::new_default(bounds.width(), bounds.height());
        for &(x, y) in &cells {
            mask[(x - bounds.x_min, y - bounds.y_min)] = labels[(x, y)];
        }
        let cluster = Cluster {
            contents: image.crop(bounds.x_min, bounds.y_min, bounds.width(), bounds.height()),
            mask,
            bounds,
        };

        match config.strip_width {
            Some(strip) if cluster.width() > strip => clusters.extend(split_wide(&cluster, strip)),
            _ => clusters.push(cluster),
        }
    }

    clusters
}

/// Keeps components whose extent `max - min` is larger than `min_extent`
/// both horizontally and vertically.
#[inline]
fn exceeds_noise(bounds: &Aabb, min_extent: usize) -> bool {
    bounds.x_max - bounds.x_min > min_extent && bounds.y_max - bounds.y_min > min_extent
}

/// Advances `cursor` to the next remaining cell in row-major order.
fn next_seed(remaining: &Buffer2<bool>, cursor: &mut usize) -> Option<(usize, usize)> {
    let offset = remaining.pixels()[*cursor..].iter().position(|&v| v)?;
    *cursor += offset;
    Some((*cursor % remaining.width(), *cursor / remaining.width()))
}

/// Claims the 4-connected component containing `start` from `remaining`.
///
/// Returns the component's bounds and its cells in visit order. Every
/// claimed cell is cleared in `remaining`.
pub fn flood_fill(remaining: &mut Buffer2<bool>, start: (usize, usize)) -> (Aabb, Vec<(usize, usize)>) {
    let (width, height) = (remaining.width(), remaining.height());
    let mut bounds = Aabb::seed(start.0, start.1);
    let mut cells = Vec::new();
    let mut queue = VecDeque::new();

    remaining[start] = false;
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        bounds.include(x, y);
        cells.push((x, y));

        let neighbors = [
            (y > 0).then(|| (x, y - 1)),
            (y + 1 < height).then(|| (x, y + 1)),
            (x > 0).then(|| (x - 1, y)),
            (x + 1 < width).then(|| (x + 1, y)),
        ];
        for next in neighbors.into_iter().flatten() {
            if remaining[next] {
                remaining[next] = false;
                queue.push_back(next);
            }
        }
    }

    (bounds, cells)
}

/// Cuts `cluster` into `strip`-wide column ranges, left to right. The last
/// strip keeps whatever width is left.
pub fn split_wide(cluster: &Cluster, strip: usize) -> Vec<Cluster> {
    assert!(strip > 0, "strip width must be positive");
    (0..cluster.width())
        .step_by(strip)
        .map(|x| cluster.columns(x, strip.min(cluster.width() - x)))
        .collect()
}

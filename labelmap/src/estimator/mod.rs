//! Coarse-to-fine rotation and mirror search.
//!
//! Every hypothesis rotates the whole source onto an expanded canvas, cuts a
//! centered square template out of it and slides the template over the
//! destination. Each configured [`MatchMethod`] keeps its own best hypothesis;
//! the round's answer is the angle most metrics agree on.
//!
//! # Rounds
//!
//! 1. Scan `steps` angles over `[range_min, range_max)`.
//! 2. Take the majority angle over all metrics' bests.
//! 3. If it lies within `convergence_tolerance` of the angle the round was
//!    centered on, vote flip and location the same way and stop.
//! 4. Otherwise scan `refine_steps` angles over one step centered on the
//!    majority and repeat.
//!
//! Metric bests persist across rounds, so a round that improves on nothing
//! repeats the previous majority and converges.

mod vote;


pub use vote::majority_vote;

use glam::IVec2;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{SearchConfig, TemplateSize};
use crate::correlation::Correlator;
use crate::math::normalize_degrees;
use crate::matcher::{MatchCandidate, MatchMethod, Matcher};
use crate::raster::GrayImage;
use crate::warp::{Interpolation, rotate, rotated_extent};

/// Usage errors that prevent a search from running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("source image is empty")]
    EmptySource,

    #[error("destination image is empty")]
    EmptyDestination,

    #[error("no similarity methods configured")]
    NoMethods,

    #[error("template at {angle:.3} degrees would be empty")]
    EmptyTemplate { angle: f64 },

    #[error("template side {side} does not fit destination {width}x{height}")]
    TemplateTooLarge {
        side: usize,
        width: usize,
        height: usize,
    },

    #[error("no hypothesis could be scored")]
    NoMatch,
}

/// Result of one [`OrientationEstimator::estimate`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationEstimate {
    /// Counter-clockwise rotation in degrees, in `[0, 360)`.
    pub angle: f64,
    /// Whether the rotated source is mirrored left to right.
    pub flipped: bool,
    /// Top-left of the matched template in the destination.
    pub template_location: IVec2,
    /// Top-left of the whole rotated (and mirrored) source in the destination.
    /// May lie outside the destination.
    pub origin: IVec2,
    /// Template side at the final angle.
    pub template_side: usize,
    /// Search rounds run, including the first.
    pub rounds: usize,
    /// Each metric's best, in method order.
    pub candidates: Vec<MatchCandidate>,
}

/// Offset of a centered `side x side` square inside a `width x height` image.
#[inline]
pub fn template_offset(width: usize, height: usize, side: usize) -> IVec2 {
    IVec2::new(
        (width / 2) as i32 - (side / 2) as i32,
        (height / 2) as i32 - (side / 2) as i32,
    )
}

/// Combines one [`Matcher`] per configured method into a rotation search.
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    methods: Vec<MatchMethod>,
    template: TemplateSize,
}

impl OrientationEstimator {
    pub fn new(methods: &[MatchMethod], template: TemplateSize) -> Self {
        Self {
            methods: methods.to_vec(),
            template,
        }
    }

    #[inline]
    pub fn methods(&self) -> &[MatchMethod] {
        &self.methods
    }

    /// Searches for the rotation and mirror that place `source` inside
    /// `destination`.
    ///
    /// Fails without searching when either image is empty, no methods are
    /// configured, or a template at any angle the search can reach would be
    /// empty or larger than the destination.
    pub fn estimate(
        &self,
        source: &GrayImage,
        destination: &GrayImage,
        search: &SearchConfig,
    ) -> Result<OrientationEstimate, EstimateError> {
        search.validate();
        if source.is_empty() {
            return Err(EstimateError::EmptySource);
        }
        if destination.is_empty() {
            return Err(EstimateError::EmptyDestination);
        }
        if self.methods.is_empty() {
            return Err(EstimateError::NoMethods);
        }

        let first_round: Vec<f64> =
            scan_angles(search.range_min, search.range_max, search.steps).collect();
        for &angle in &first_round {
            self.template_side(source, destination, angle)?;
        }
        let reach = refinement_reach(search);
        for &angle in &first_round {
            for critical in critical_angles(angle - reach, angle + reach) {
                self.template_side(source, destination, critical)?;
            }
        }

        let correlator = Correlator::new(destination);

        let mut matchers: Vec<Matcher> = self.methods.iter().copied().map(Matcher::new).collect();
        let mut range = (search.range_min, search.range_max);
        let mut steps = search.steps;
        let mut previous = search.center;
        let mut rounds = 0;

        let angle = loop {
            rounds += 1;
            let step = (range.1 - range.0) / steps as f64;
            for angle in scan_angles(range.0, range.1, steps) {
                self.scan(source, destination, &correlator, &mut matchers, angle, search.allow_flip)?;
            }

            let majority = majority_vote(matchers.iter().filter_map(|m| m.best().map(|b| b.angle)))
                .ok_or(EstimateError::NoMatch)?;
            debug!(
                "Round {}: [{:.3}, {:.3}) in {} steps, majority {:.3}",
                rounds, range.0, range.1, steps, majority
            );

            if (majority - previous).abs() < search.convergence_tolerance {
                break majority;
            }
            if rounds >= search.max_rounds {
                warn!(
                    "Orientation search stopped after {} rounds without converging, using {:.3}",
                    rounds, majority
                );
                break majority;
            }

            range = (majority - step / 2.0, majority + step / 2.0);
            steps = search.refine_steps;
            previous = majority;
        };

        let candidates: Vec<MatchCandidate> =
            matchers.iter().filter_map(|m| m.best().copied()).collect();
        let flipped = majority_vote(candidates.iter().map(|c| c.flipped)).unwrap_or(false);
        let template_location =
            majority_vote(candidates.iter().map(|c| c.location)).ok_or(EstimateError::NoMatch)?;

        let (width, height) = rotated_extent(source.width(), source.height(), angle);
        let template_side = self.template.side_for(width, height);
        let origin = template_location - template_offset(width, height, template_side);

        let estimate = OrientationEstimate {
            angle: normalize_degrees(angle),
            flipped,
            template_location,
            origin,
            template_side,
            rounds,
            candidates,
        };
        info!(
            "Orientation: {:.3} degrees, flipped {}, origin ({}, {}) after {} rounds",
            estimate.angle, estimate.flipped, estimate.origin.x, estimate.origin.y, estimate.rounds
        );
        Ok(estimate)
    }

    /// Template side for `source` rotated by `angle`, checked against the
    /// destination.
    fn template_side(
        &self,
        source: &GrayImage,
        destination: &GrayImage,
        angle: f64,
    ) -> Result<usize, EstimateError> {
        let (width, height) = rotated_extent(source.width(), source.height(), angle);
        let side = self.template.side_for(width, height);
        if side == 0 {
            return Err(EstimateError::EmptyTemplate { angle });
        }
        if side > destination.width() || side > destination.height() {
            return Err(EstimateError::TemplateTooLarge {
                side,
                width: destination.width(),
                height: destination.height(),
            });
        }
        Ok(side)
    }

    /// Feeds the hypotheses at one angle to every matcher.
    fn scan(
        &self,
        source: &GrayImage,
        destination: &GrayImage,
        correlator: &Correlator,
        matchers: &mut [Matcher],
        angle: f64,
        allow_flip: bool,
    ) -> Result<(), EstimateError> {
        let side = self.template_side(source, destination, angle)?;
        let rotated = rotate(source, angle, Interpolation::Bilinear);
        let offset = template_offset(rotated.width(), rotated.height(), side);
        let (x, y) = (offset.x as usize, offset.y as usize);

        let terms = correlator.terms(&rotated.crop(x, y, side, side));
        for matcher in matchers.iter_mut() {
            matcher.observe(&terms, angle, false);
        }

        if allow_flip {
            let terms = correlator.terms(&rotated.flip_horizontal().crop(x, y, side, side));
            for matcher in matchers.iter_mut() {
                matcher.observe(&terms, angle, true);
            }
        }
        Ok(())
    }
}

/// Bound on how far any refinement round can scan from the first-round angle
/// it descends from.
///
/// Round `k` scans within half a step of round `k - 1`'s majority, and steps
/// shrink by `refine_steps` each round.
fn refinement_reach(search: &SearchConfig) -> f64 {
    let shrink = 1.0 / search.refine_steps as f64;
    let half_steps: f64 = (0..search.max_rounds.saturating_sub(1))
        .map(|k| shrink.powi(k as i32))
        .sum();
    half_steps * search.step_size() / 2.0
}

/// Angles in `[lo, hi]` where the template side peaks or dips: both ends and
/// every multiple of 45 degrees in between. The side is monotone between them.
fn critical_angles(lo: f64, hi: f64) -> impl Iterator<Item = f64> {
    let first = (lo / 45.0).ceil() as i64;
    let last = (hi / 45.0).floor() as i64;
    [lo, hi]
        .into_iter()
        .chain((first..=last).map(|k| k as f64 * 45.0))
}

/// `steps` angles starting at `min`, spaced by `(max - min) / steps`.
fn scan_angles(min: f64, max: f64, steps: usize) -> impl Iterator<Item = f64> {
    let step = (max - min) / steps as f64;
    (0..steps).map(move |i| min + i as f64 * step)
}

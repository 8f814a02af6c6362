//! Configuration types for orientation search, segmentation and the mapping
//! pipeline.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! needs the fields it changes. `try_validate()` reports values no search can
//! use; `validate()` panics on them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::MatchMethod;

/// A configuration value no search can use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

#[inline]
fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError(message()))
    }
}

fn panic_on_invalid(result: Result<(), ConfigError>) {
    if let Err(err) = result {
        panic!("{}", err);
    }
}

// =============================================================================
// Template extraction
// =============================================================================

/// Side length of the centered square template cut from a rotated source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSize {
    /// Fraction of the rotated image's shorter side.
    Ratio(f64),
    /// Fixed side in pixels, capped at the rotated image's shorter side.
    Fixed(usize),
}

impl Default for TemplateSize {
    fn default() -> Self {
        TemplateSize::Ratio(0.3)
    }
}

impl TemplateSize {
    /// Template side for a `width x height` rotated source.
    pub fn side_for(&self, width: usize, height: usize) -> usize {
        let min_side = width.min(height);
        match *self {
            TemplateSize::Ratio(ratio) => (ratio * min_side as f64) as usize,
            TemplateSize::Fixed(side) => side.min(min_side),
        }
    }

    pub fn try_validate(&self) -> Result<(), ConfigError> {
        match *self {
            TemplateSize::Ratio(ratio) => ensure(ratio > 0.0 && ratio <= 1.0, || {
                format!("template ratio must be in (0, 1], got {}", ratio)
            }),
            TemplateSize::Fixed(side) => {
                ensure(side > 0, || "fixed template side must be positive".into())
            }
        }
    }

    pub fn validate(&self) {
        panic_on_invalid(self.try_validate());
    }
}

// =============================================================================
// Orientation search
// =============================================================================

/// Coarse-to-fine rotation search window.
///
/// The first round scans `[range_min, range_max)` in `steps` equal steps.
/// Each further round scans one step around the round's majority angle in
/// `refine_steps` steps, until the majority lands within
/// `convergence_tolerance` of the angle that centered the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Start of the first round's angle range in degrees (inclusive).
    pub range_min: f64,
    /// End of the first round's angle range in degrees (exclusive).
    pub range_max: f64,
    /// Number of angles scanned in the first round.
    pub steps: usize,
    /// Also try a horizontally mirrored template at every angle.
    pub allow_flip: bool,
    /// Angle the first round is considered centered on.
    pub center: f64,
    /// Majority angles closer than this to the round center end the search.
    pub convergence_tolerance: f64,
    /// Number of angles scanned in every refinement round.
    pub refine_steps: usize,
    /// Upper bound on rounds, including the first.
    pub max_rounds: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::global()
    }
}

impl SearchConfig {
    /// Full-circle sweep with mirroring, used to place the whole fragment.
    pub fn global() -> Self {
        Self {
            range_min: 0.0,
            range_max: 360.0,
            steps: 36,
            allow_flip: true,
            center: 0.0,
            convergence_tolerance: 0.1,
            refine_steps: 7,
            max_rounds: 32,
        }
    }

    /// Narrow sweep around an already resolved orientation.
    pub fn local() -> Self {
        Self {
            range_min: -10.0,
            range_max: 10.0,
            steps: 20,
            allow_flip: false,
            ..Self::global()
        }
    }

    /// Width of one first-round step in degrees.
    #[inline]
    pub fn step_size(&self) -> f64 {
        (self.range_max - self.range_min) / self.steps as f64
    }

    pub fn try_validate(&self) -> Result<(), ConfigError> {
        ensure(self.range_max > self.range_min, || {
            format!(
                "search range must be non-empty, got [{}, {})",
                self.range_min, self.range_max
            )
        })?;
        ensure(self.steps > 0, || "search steps must be positive".into())?;
        ensure(self.refine_steps > 0, || {
            "refinement steps must be positive".into()
        })?;
        ensure(self.convergence_tolerance > 0.0, || {
            format!(
                "convergence tolerance must be positive, got {}",
                self.convergence_tolerance
            )
        })?;
        ensure(self.max_rounds > 0, || "max_rounds must be at least 1".into())
    }

    pub fn validate(&self) {
        panic_on_invalid(self.try_validate());
    }
}

// =============================================================================
// Segmentation
// =============================================================================

/// Cluster extraction from a label mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Components whose horizontal or vertical extent (`max - min`) is not
    /// larger than this are dropped as noise.
    pub min_extent: usize,
    /// Components wider than this are cut into strips of this width.
    /// `None` keeps every component whole.
    pub strip_width: Option<usize>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_extent: 20,
            strip_width: Some(500),
        }
    }
}

impl SegmentConfig {
    pub fn try_validate(&self) -> Result<(), ConfigError> {
        ensure(self.strip_width != Some(0), || {
            "strip width must be positive".into()
        })
    }

    pub fn validate(&self) {
        panic_on_invalid(self.try_validate());
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Two-stage label transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Similarity metrics, in majority-vote tie-break order.
    pub methods: Vec<MatchMethod>,
    /// Template extraction for both stages.
    pub template: TemplateSize,
    /// Whole-fragment search.
    pub global: SearchConfig,
    /// Per-cluster search.
    pub local: SearchConfig,
    pub segment: SegmentConfig,
    /// Pixels added on every side of a cluster's projected box to form its
    /// search window in the large image.
    pub window_margin: usize,
    /// Center the small image and its labels on a zero square canvas of the
    /// diagonal's length before searching.
    pub pad_small_to_square: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            methods: MatchMethod::default_set().to_vec(),
            template: TemplateSize::default(),
            global: SearchConfig::global(),
            local: SearchConfig::local(),
            segment: SegmentConfig::default(),
            window_margin: 200,
            pad_small_to_square: false,
        }
    }
}

impl PipelineConfig {
    /// Checks every section, reporting the first bad value.
    pub fn try_validate(&self) -> Result<(), ConfigError> {
        ensure(!self.methods.is_empty(), || {
            "at least one similarity method is required".into()
        })?;
        self.template.try_validate()?;
        self.global.try_validate()?;
        self.local.try_validate()?;
        self.segment.try_validate()
    }

    /// Panicking form of [`try_validate`](Self::try_validate) for configs
    /// built in code.
    pub fn validate(&self) {
        panic_on_invalid(self.try_validate());
    }
}

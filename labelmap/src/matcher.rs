//! Single-metric tracking of the best orientation hypothesis.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::correlation::{CorrelationTerms, min_max_loc};

/// Template similarity metric.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    SqDiff,
    SqDiffNormed,
    CCorr,
    CCorrNormed,
    CCoeff,
    CCoeffNormed,
}

impl MatchMethod {
    /// Metrics used when none are configured, in vote tie-break order.
    pub const fn default_set() -> [MatchMethod; 3] {
        [
            MatchMethod::CCoeffNormed,
            MatchMethod::CCorrNormed,
            MatchMethod::SqDiffNormed,
        ]
    }

    /// Squared-difference metrics score a perfect match lowest.
    #[inline]
    pub const fn lower_is_better(self) -> bool {
        matches!(self, MatchMethod::SqDiff | MatchMethod::SqDiffNormed)
    }

    /// Maps a raw extremum onto the shared higher-is-better scale.
    #[inline]
    pub fn normalize(self, raw: f64) -> f64 {
        match self {
            MatchMethod::SqDiffNormed => 1.0 - raw,
            MatchMethod::SqDiff => {
                if raw <= 0.0 {
                    f64::INFINITY
                } else {
                    1.0 / raw
                }
            }
            _ => raw,
        }
    }
}

/// Best hypothesis seen by one [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    /// Normalized score, higher is better.
    pub score: f64,
    /// Rotation in degrees as scanned, not normalized.
    pub angle: f64,
    pub flipped: bool,
    /// Top-left of the template in the destination, `(x = column, y = row)`.
    pub location: IVec2,
}

/// Keeps the best hypothesis for one metric across an estimator run.
///
/// A hypothesis replaces the current best only when its normalized score is
/// strictly greater, so among equal scores the first one observed wins.
#[derive(Debug, Clone)]
pub struct Matcher {
    method: MatchMethod,
    best: Option<MatchCandidate>,
}

impl Matcher {
    pub fn new(method: MatchMethod) -> Self {
        Self { method, best: None }
    }

    #[inline]
    pub fn method(&self) -> MatchMethod {
        self.method
    }

    #[inline]
    pub fn best(&self) -> Option<&MatchCandidate> {
        self.best.as_ref()
    }

    /// Scores one hypothesis from precomputed correlation terms.
    /// Returns `true` when it became the new best.
    pub fn observe(&mut self, terms: &CorrelationTerms, angle: f64, flipped: bool) -> bool {
        let map = terms.similarity_map(self.method);
        let Some(extrema) = min_max_loc(&map) else {
            return false;
        };

        let (raw, location) = if self.method.lower_is_better() {
            (extrema.min_value, extrema.min_loc)
        } else {
            (extrema.max_value, extrema.max_loc)
        };

        self.offer(MatchCandidate {
            score: self.method.normalize(raw as f64),
            angle,
            flipped,
            location,
        })
    }

    /// Records `candidate` if it strictly beats the current best.
    pub fn offer(&mut self, candidate: MatchCandidate) -> bool {
        let improved = match &self.best {
            None => true,
            Some(best) => candidate.score > best.score,
        };
        if improved {
            self.best = Some(candidate);
        }
        improved
    }
}

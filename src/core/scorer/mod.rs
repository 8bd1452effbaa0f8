//! # Scorer Module
//!
//! Scores how likely two images are the dark and light render of one screen.
//!
//! ## Signals
//! | Signal     | Weight | Behavior                                               |
//! |------------|--------|--------------------------------------------------------|
//! | Edge hash  | 0.50   | `1 - hamming/256`, rescaled so chance agreement is 0   |
//! | Luminance  | 0.35   | 0 for gaps <= 16, 1 for gaps >= 48, linear in between  |
//! | Aspect     | 0.15   | 1 for equal ratios, falls to 0 at 8% relative mismatch |
//!
//! A relative aspect mismatch above the tolerance disqualifies the pair.
//!
//! Chance agreement comes from the bit densities of both hashes:
//! `pa * pb + (1 - pa) * (1 - pb)`. Two mostly-empty hashes agree on most
//! bits without sharing any structure, so raw similarity alone overrates them.
//!
//! ## Thresholds
//! | Score        | Tier                   |
//! |--------------|------------------------|
//! | >= 0.85      | Auto-pair              |
//! | 0.70 - 0.85  | Review                 |
//! | < 0.70       | Not a candidate        |

mod traits;

pub use traits::{MatchStrategy, ThresholdStrategy};

use crate::core::features::{EdgeHash, ImageFeatures};
use serde::{Deserialize, Serialize};

/// Weight of the edge-hash signal
pub const EDGE_WEIGHT: f64 = 0.50;
/// Weight of the luminance-contrast signal
pub const LUMINANCE_WEIGHT: f64 = 0.35;
/// Weight of the aspect-ratio signal
pub const ASPECT_WEIGHT: f64 = 0.15;

/// Scores at or above this are paired without review
pub const AUTO_PAIR_THRESHOLD: f64 = 0.85;
/// Scores at or above this (and below auto) go to review
pub const REVIEW_THRESHOLD: f64 = 0.70;

/// Luminance gaps at or below this look like the same theme
pub const MIN_LUMINANCE_GAP: f64 = 16.0;
/// Luminance gaps at or above this are an unambiguous theme flip
pub const FULL_LUMINANCE_GAP: f64 = 48.0;
/// Maximum relative aspect-ratio difference before disqualification
pub const ASPECT_TOLERANCE: f64 = 0.08;

/// Tunable weights and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub edge_weight: f64,
    pub luminance_weight: f64,
    pub aspect_weight: f64,
    pub auto_threshold: f64,
    pub review_threshold: f64,
    pub min_luminance_gap: f64,
    pub full_luminance_gap: f64,
    pub aspect_tolerance: f64,
}

impl ScoringConfig {
    /// Create a configuration with the documented defaults
    pub fn new() -> Self {
        Self {
            edge_weight: EDGE_WEIGHT,
            luminance_weight: LUMINANCE_WEIGHT,
            aspect_weight: ASPECT_WEIGHT,
            auto_threshold: AUTO_PAIR_THRESHOLD,
            review_threshold: REVIEW_THRESHOLD,
            min_luminance_gap: MIN_LUMINANCE_GAP,
            full_luminance_gap: FULL_LUMINANCE_GAP,
            aspect_tolerance: ASPECT_TOLERANCE,
        }
    }

    /// Fewer auto-pairs, more review items
    pub fn strict() -> Self {
        Self::new().thresholds(0.92, 0.75)
    }

    /// The documented defaults
    pub fn balanced() -> Self {
        Self::new()
    }

    /// More auto-pairs, wider review band
    pub fn lenient() -> Self {
        Self::new().thresholds(0.80, 0.62)
    }

    /// Set the auto and review thresholds
    pub fn thresholds(mut self, auto: f64, review: f64) -> Self {
        self.auto_threshold = auto;
        self.review_threshold = review;
        self
    }

    /// Set the signal weights; they are normalized to sum to 1
    pub fn weights(mut self, edge: f64, luminance: f64, aspect: f64) -> Self {
        let total = edge + luminance + aspect;
        if total > 0.0 {
            self.edge_weight = edge / total;
            self.luminance_weight = luminance / total;
            self.aspect_weight = aspect / total;
        }
        self
    }

    /// Set the aspect-ratio tolerance
    pub fn aspect_tolerance(mut self, tolerance: f64) -> Self {
        self.aspect_tolerance = tolerance;
        self
    }

    /// Check weights, thresholds and tolerances
    pub fn validate(&self) -> Result<(), String> {
        let weights = [self.edge_weight, self.luminance_weight, self.aspect_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_string());
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err("at least one weight must be positive".to_string());
        }
        if !self.aspect_tolerance.is_finite() || self.aspect_tolerance <= 0.0 {
            return Err(format!(
                "aspect tolerance must be positive, got {}",
                self.aspect_tolerance
            ));
        }
        if !(0.0..=1.0).contains(&self.review_threshold)
            || !(0.0..=1.0).contains(&self.auto_threshold)
        {
            return Err("thresholds must be within 0.0-1.0".to_string());
        }
        if self.review_threshold > self.auto_threshold {
            return Err(format!(
                "review threshold {} is above auto threshold {}",
                self.review_threshold, self.auto_threshold
            ));
        }
        if self.full_luminance_gap <= self.min_luminance_gap {
            return Err("full luminance gap must exceed the minimum gap".to_string());
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome tier of a scored pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Accepted without human review
    Auto,
    /// Needs a human accept/reject
    Review,
}

impl MatchTier {
    /// Short reason attached to pairs of this tier
    pub fn reason(&self) -> &'static str {
        match self {
            MatchTier::Auto => "high match",
            MatchTier::Review => "borderline",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTier::Auto => write!(f, "Auto-pair"),
            MatchTier::Review => write!(f, "Needs review"),
        }
    }
}

/// Every sub-score that went into a pair score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Raw edge-hash similarity in [0, 1]
    pub edge_similarity: f64,
    /// Edge similarity rescaled against chance agreement
    pub edge_score: f64,
    pub luminance_gap: f64,
    pub luminance_score: f64,
    pub aspect_score: f64,
    /// Aspect mismatch beyond tolerance
    pub disqualified: bool,
    /// Weighted total in [0, 1]
    pub total: f64,
}

impl ScoreBreakdown {
    /// One-line technical summary for verbose output
    pub fn describe(&self) -> String {
        if self.disqualified {
            return "aspect ratios differ too much".to_string();
        }
        format!(
            "edges {:.0}% alike, luminance gap {:.0}, aspect {:.0}%",
            self.edge_similarity * 100.0,
            self.luminance_gap,
            self.aspect_score * 100.0
        )
    }
}

/// Score a pair with the default configuration
pub fn score_pair(a: &ImageFeatures, b: &ImageFeatures) -> f64 {
    score_breakdown(a, b, &ScoringConfig::default()).total
}

/// Score a pair and keep the sub-scores
pub fn score_breakdown(
    a: &ImageFeatures,
    b: &ImageFeatures,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let edge_similarity = a.edge_hash.similarity(&b.edge_hash);
    let edge_score = above_chance(edge_similarity, &a.edge_hash, &b.edge_hash);

    let luminance_gap = (a.mean_luminance - b.mean_luminance).abs();
    let luminance_score = ((luminance_gap - config.min_luminance_gap)
        / (config.full_luminance_gap - config.min_luminance_gap))
        .clamp(0.0, 1.0);

    let aspect_diff = relative_aspect_difference(a.aspect_ratio, b.aspect_ratio);
    let disqualified = aspect_diff > config.aspect_tolerance;
    let aspect_score = if disqualified || config.aspect_tolerance <= 0.0 {
        if aspect_diff == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - aspect_diff / config.aspect_tolerance
    };

    let total = if disqualified {
        0.0
    } else {
        (config.edge_weight * edge_score
            + config.luminance_weight * luminance_score
            + config.aspect_weight * aspect_score)
            .clamp(0.0, 1.0)
    };

    ScoreBreakdown {
        edge_similarity,
        edge_score,
        luminance_gap,
        luminance_score,
        aspect_score,
        disqualified,
        total,
    }
}

/// Rescale similarity so agreement expected by chance scores 0.
///
/// Two hashes that are both all-zero (or all-one) have no chance term to
/// beat; they count as a match only when identical.
fn above_chance(similarity: f64, a: &EdgeHash, b: &EdgeHash) -> f64 {
    let (pa, pb) = (a.density(), b.density());
    let chance = pa * pb + (1.0 - pa) * (1.0 - pb);
    if chance >= 1.0 {
        return if similarity >= 1.0 { 1.0 } else { 0.0 };
    }
    ((similarity - chance) / (1.0 - chance)).clamp(0.0, 1.0)
}

fn relative_aspect_difference(a: f64, b: f64) -> f64 {
    let larger = a.max(b);
    if larger <= 0.0 || !larger.is_finite() {
        return 1.0;
    }
    (a - b).abs() / larger
}

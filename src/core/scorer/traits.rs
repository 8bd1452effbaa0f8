//! Trait definitions for pair scoring strategies.

use super::{score_breakdown, MatchTier, ScoreBreakdown, ScoringConfig};
use crate::core::features::ImageFeatures;

/// Strategy trait for scoring and classifying candidate pairs
pub trait MatchStrategy: Send + Sync {
    /// Score two images; higher is a more likely dark/light pair
    fn score(&self, a: &ImageFeatures, b: &ImageFeatures) -> ScoreBreakdown;

    /// Classify a score, or `None` when it is not a candidate at all
    fn classify(&self, score: f64) -> Option<MatchTier>;

    /// Lowest score that still counts as a candidate
    fn review_threshold(&self) -> f64;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Weighted-sum scoring with fixed auto/review thresholds
#[derive(Debug, Clone, Default)]
pub struct ThresholdStrategy {
    config: ScoringConfig,
}

impl ThresholdStrategy {
    /// Create a strategy from a scoring configuration
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Fewer auto-pairs (auto >= 0.92, review >= 0.75)
    pub fn strict() -> Self {
        Self::new(ScoringConfig::strict())
    }

    /// Default thresholds (auto >= 0.85, review >= 0.70)
    pub fn balanced() -> Self {
        Self::new(ScoringConfig::balanced())
    }

    /// More auto-pairs (auto >= 0.80, review >= 0.62)
    pub fn lenient() -> Self {
        Self::new(ScoringConfig::lenient())
    }

    /// The configuration in use
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

impl MatchStrategy for ThresholdStrategy {
    fn score(&self, a: &ImageFeatures, b: &ImageFeatures) -> ScoreBreakdown {
        score_breakdown(a, b, &self.config)
    }

    fn classify(&self, score: f64) -> Option<MatchTier> {
        if score >= self.config.auto_threshold {
            Some(MatchTier::Auto)
        } else if score >= self.config.review_threshold {
            Some(MatchTier::Review)
        } else {
            None
        }
    }

    fn review_threshold(&self) -> f64 {
        self.config.review_threshold
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: score >= {:.2} auto-pairs, >= {:.2} goes to review",
            self.config.auto_threshold, self.config.review_threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_at_boundaries() {
        let strategy = ThresholdStrategy::balanced();

        assert_eq!(strategy.classify(0.85), Some(MatchTier::Auto));
        assert_eq!(strategy.classify(0.8499), Some(MatchTier::Review));
        assert_eq!(strategy.classify(0.70), Some(MatchTier::Review));
        assert_eq!(strategy.classify(0.6999), None);
    }

    #[test]
    fn preset_strategies() {
        assert_eq!(ThresholdStrategy::strict().review_threshold(), 0.75);
        assert_eq!(ThresholdStrategy::balanced().review_threshold(), 0.70);
        assert_eq!(ThresholdStrategy::lenient().review_threshold(), 0.62);
    }

    #[test]
    fn description_includes_thresholds() {
        let desc = ThresholdStrategy::balanced().description();
        assert!(desc.contains("0.85"));
        assert!(desc.contains("0.70"));
    }
}

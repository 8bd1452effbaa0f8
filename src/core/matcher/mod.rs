//! # Matcher Module
//!
//! Turns a batch of images into dark/light pairs, review items and leftovers.
//!
//! ## How It Works
//! 1. Score every unordered image pair; drop pairs below the review threshold
//! 2. Sort candidates by score, ties broken by the two image ids
//! 3. Take candidates in order, skipping any that reuse a claimed image
//! 4. Auto-tier candidates become pairs, review-tier ones review items
//! 5. Every unclaimed image is unmatched
//!
//! No image is ever part of two selected candidates.

mod assignment;

pub use assignment::{find_candidates, select_conflict_free, Candidate};

use crate::core::scorer::{MatchStrategy, MatchTier, ThresholdStrategy};
use crate::core::session::{LibraryImage, LibraryPair, PairStatus, ReviewItem};
use crate::events::{null_sender, Event, EventSender, MatchEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Output of one matcher run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingResult {
    pub auto_pairs: Vec<LibraryPair>,
    pub review_pairs: Vec<ReviewItem>,
    /// In input order
    pub unmatched_image_ids: Vec<String>,
}

impl PairingResult {
    /// Total number of images accounted for
    pub fn image_count(&self) -> usize {
        (self.auto_pairs.len() + self.review_pairs.len()) * 2 + self.unmatched_image_ids.len()
    }
}

/// Runs the pairing algorithm with a scoring strategy
pub struct PairMatcher {
    strategy: Box<dyn MatchStrategy>,
}

impl PairMatcher {
    /// Create a matcher with a custom strategy
    pub fn new(strategy: Box<dyn MatchStrategy>) -> Self {
        Self { strategy }
    }

    /// The strategy in use
    pub fn strategy(&self) -> &dyn MatchStrategy {
        self.strategy.as_ref()
    }

    /// Pair a batch of images
    pub fn match_images(&self, images: &[LibraryImage]) -> PairingResult {
        self.match_images_with_events(images, &null_sender())
    }

    /// Pair a batch of images, emitting progress events
    pub fn match_images_with_events(
        &self,
        images: &[LibraryImage],
        events: &EventSender,
    ) -> PairingResult {
        events.send(Event::Match(MatchEvent::Started {
            total_images: images.len(),
        }));

        let candidates = find_candidates(images, self.strategy.as_ref(), events);
        let candidate_count = candidates.len();
        let selected = select_conflict_free(candidates, images);

        let mut claimed = vec![false; images.len()];
        let mut result = PairingResult::default();

        for candidate in selected {
            claimed[candidate.a] = true;
            claimed[candidate.b] = true;

            let pair = LibraryPair::new(
                images[candidate.a].clone(),
                images[candidate.b].clone(),
                candidate.score(),
                PairStatus::Auto,
                candidate.tier.reason(),
            );

            debug!(
                pair_id = %pair.id,
                score = candidate.score(),
                tier = %candidate.tier,
                "Selected pair"
            );

            match candidate.tier {
                MatchTier::Auto => result.auto_pairs.push(pair),
                MatchTier::Review => result.review_pairs.push(ReviewItem::new(pair)),
            }
        }

        result.unmatched_image_ids = images
            .iter()
            .zip(claimed)
            .filter(|(_, is_claimed)| !is_claimed)
            .map(|(image, _)| image.id.clone())
            .collect();

        info!(
            images = images.len(),
            candidates = candidate_count,
            auto = result.auto_pairs.len(),
            review = result.review_pairs.len(),
            unmatched = result.unmatched_image_ids.len(),
            "Matcher run complete"
        );

        events.send(Event::Match(MatchEvent::Completed {
            auto_pairs: result.auto_pairs.len(),
            review_pairs: result.review_pairs.len(),
            unmatched: result.unmatched_image_ids.len(),
        }));

        result
    }
}

impl Default for PairMatcher {
    fn default() -> Self {
        Self::new(Box::new(ThresholdStrategy::balanced()))
    }
}

/// Pair a batch of images with the default strategy
pub fn build_library_pairs(images: &[LibraryImage]) -> PairingResult {
    PairMatcher::default().match_images(images)
}

/// Pair a batch of images with the default strategy, emitting progress events
pub fn build_library_pairs_with_events(
    images: &[LibraryImage],
    events: &EventSender,
) -> PairingResult {
    PairMatcher::default().match_images_with_events(images, events)
}

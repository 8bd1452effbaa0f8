//! Candidate discovery and conflict-free selection.
//!
//! Every unordered image pair is scored once. Candidates are then taken in
//! descending score order, skipping any that touch an image already claimed
//! by a better candidate. The result is a maximal matching that favors high
//! scores and is reproducible for a given input.

use crate::core::scorer::{MatchStrategy, MatchTier, ScoreBreakdown};
use crate::core::session::LibraryImage;
use crate::events::{Event, EventSender, MatchEvent, MatchProgress};
use std::cmp::Ordering;

/// A scored image pair above the review threshold
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Index of the first image in the input slice
    pub a: usize,
    /// Index of the second image in the input slice
    pub b: usize,
    pub breakdown: ScoreBreakdown,
    pub tier: MatchTier,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }

    /// Lexical `(smaller id, larger id)` key used to break score ties
    fn tie_key<'a>(&self, images: &'a [LibraryImage]) -> (&'a str, &'a str) {
        let a = images[self.a].id.as_str();
        let b = images[self.b].id.as_str();
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Score all unordered pairs and keep those at or above the review threshold
pub fn find_candidates(
    images: &[LibraryImage],
    strategy: &dyn MatchStrategy,
    events: &EventSender,
) -> Vec<Candidate> {
    let n = images.len();
    let total_comparisons = n.saturating_sub(1) * n / 2;
    let update_interval = std::cmp::min(1000, std::cmp::max(1, total_comparisons / 50));

    let mut candidates = Vec::new();
    let mut comparisons_completed = 0;
    let mut last_progress_update = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            let breakdown = strategy.score(&images[i].features, &images[j].features);

            if breakdown.total >= strategy.review_threshold() {
                if let Some(tier) = strategy.classify(breakdown.total) {
                    candidates.push(Candidate {
                        a: i,
                        b: j,
                        breakdown,
                        tier,
                    });
                }
            }

            comparisons_completed += 1;
            if events.is_attached()
                && comparisons_completed - last_progress_update >= update_interval
            {
                events.send(Event::Match(MatchEvent::Progress(MatchProgress {
                    comparisons_completed,
                    total_comparisons,
                    candidates_found: candidates.len(),
                })));
                last_progress_update = comparisons_completed;
            }
        }
    }

    candidates
}

/// Sort by score (descending, ties by id key) and greedily keep candidates
/// whose images are both still free.
pub fn select_conflict_free(
    mut candidates: Vec<Candidate>,
    images: &[LibraryImage],
) -> Vec<Candidate> {
    candidates.sort_by(|x, y| candidate_order(x, y, images));

    let mut claimed = vec![false; images.len()];
    let mut selected = Vec::new();

    for candidate in candidates {
        if claimed[candidate.a] || claimed[candidate.b] {
            continue;
        }
        claimed[candidate.a] = true;
        claimed[candidate.b] = true;
        selected.push(candidate);
    }

    selected
}

fn candidate_order(x: &Candidate, y: &Candidate, images: &[LibraryImage]) -> Ordering {
    y.score()
        .total_cmp(&x.score())
        .then_with(|| x.tie_key(images).cmp(&y.tie_key(images)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::{EdgeHash, ImageFeatures, EDGE_HASH_BYTES};
    use crate::core::scorer::ThresholdStrategy;
    use crate::events::null_sender;

    fn image(id: &str, fill: u8, luminance: f64) -> LibraryImage {
        LibraryImage {
            id: id.to_string(),
            file_name: format!("{}.png", id),
            source: String::new(),
            features: ImageFeatures {
                width: 100,
                height: 200,
                aspect_ratio: 0.5,
                mean_luminance: luminance,
                grayscale_thumbnail: Vec::new(),
                edge_map: Vec::new(),
                edge_hash: EdgeHash::new([fill; EDGE_HASH_BYTES]),
            },
        }
    }

    fn candidate(a: usize, b: usize, total: f64) -> Candidate {
        Candidate {
            a,
            b,
            breakdown: ScoreBreakdown {
                edge_similarity: 1.0,
                edge_score: 1.0,
                luminance_gap: 200.0,
                luminance_score: 1.0,
                aspect_score: 1.0,
                disqualified: false,
                total,
            },
            tier: MatchTier::Auto,
        }
    }

    #[test]
    fn below_threshold_pairs_are_dropped() {
        let images = vec![image("a", 0xFF, 20.0), image("b", 0x0F, 220.0)];
        let strategy = ThresholdStrategy::balanced();
        let candidates = find_candidates(&images, &strategy, &null_sender());
        assert!(candidates.is_empty());
    }

    #[test]
    fn every_unordered_pair_is_scored_once() {
        let images = vec![
            image("a", 0x33, 20.0),
            image("b", 0x33, 220.0),
            image("c", 0x33, 225.0),
        ];
        let strategy = ThresholdStrategy::balanced();
        let candidates = find_candidates(&images, &strategy, &null_sender());

        // a-b and a-c qualify; b-c share a theme
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.a < c.b));
    }

    #[test]
    fn higher_score_claims_first() {
        let images = vec![image("a", 0, 0.0), image("b", 0, 0.0), image("c", 0, 0.0)];
        let selected = select_conflict_free(
            vec![candidate(0, 1, 0.80), candidate(0, 2, 0.95)],
            &images,
        );

        assert_eq!(selected.len(), 1);
        assert_eq!((selected[0].a, selected[0].b), (0, 2));
    }

    #[test]
    fn ties_break_by_id_not_input_order() {
        let images = vec![image("z", 0, 0.0), image("m", 0, 0.0), image("a", 0, 0.0)];
        let selected = select_conflict_free(
            vec![candidate(0, 1, 0.9), candidate(1, 2, 0.9)],
            &images,
        );

        // (a, m) sorts before (m, z)
        assert_eq!(selected.len(), 1);
        assert_eq!((selected[0].a, selected[0].b), (1, 2));
    }

    #[test]
    fn no_image_is_claimed_twice() {
        let images: Vec<_> = (0..6).map(|i| image(&format!("i{}", i), 0, 0.0)).collect();
        let mut all = Vec::new();
        for a in 0..6 {
            for b in (a + 1)..6 {
                all.push(candidate(a, b, 0.7 + (a * 7 + b) as f64 / 100.0));
            }
        }

        let selected = select_conflict_free(all, &images);

        let mut seen = std::collections::HashSet::new();
        for c in &selected {
            assert!(seen.insert(c.a));
            assert!(seen.insert(c.b));
        }
        assert_eq!(selected.len(), 3);
    }
}

//! Library session records and invariant checks.

use crate::core::features::ImageFeatures;
use crate::error::SessionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An uploaded image whose features are known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryImage {
    pub id: String,
    pub file_name: String,
    /// Opaque reference to the pixels (path, data URL, handle)
    pub source: String,
    pub features: ImageFeatures,
}

/// An image that has been decoded but not yet given a session id
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub source: String,
    pub features: ImageFeatures,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        source: impl Into<String>,
        features: ImageFeatures,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            source: source.into(),
            features,
        }
    }

    /// Attach a session id
    pub fn into_image(self, id: String) -> LibraryImage {
        LibraryImage {
            id,
            file_name: self.file_name,
            source: self.source,
            features: self.features,
        }
    }
}

/// How a pair came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    /// Chosen by the matcher above the auto threshold
    Auto,
    /// Accepted by a human from the review queue
    Manual,
}

impl std::fmt::Display for PairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairStatus::Auto => write!(f, "auto"),
            PairStatus::Manual => write!(f, "manual"),
        }
    }
}

/// Order-independent pair id derived from two image ids
pub fn pair_id(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("pair:{}+{}", first, second)
}

/// A dark/light pair of the same screenshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPair {
    pub id: String,
    pub dark_image: LibraryImage,
    pub light_image: LibraryImage,
    /// Match score in [0, 1]
    pub score: f64,
    pub status: PairStatus,
    pub reason: String,
    /// Set once a human finished editing the pair
    pub completed_at: Option<DateTime<Utc>>,
}

impl LibraryPair {
    /// Build a pair, putting the darker image on the dark side.
    ///
    /// Equal luminance falls back to id order.
    pub fn new(
        a: LibraryImage,
        b: LibraryImage,
        score: f64,
        status: PairStatus,
        reason: impl Into<String>,
    ) -> Self {
        let (dark_image, light_image) = darker_first(a, b);

        Self {
            id: pair_id(&dark_image.id, &light_image.id),
            dark_image,
            light_image,
            score: score.clamp(0.0, 1.0),
            status,
            reason: reason.into(),
            completed_at: None,
        }
    }

    /// Ids of both images, dark first
    pub fn image_ids(&self) -> [&str; 2] {
        [&self.dark_image.id, &self.light_image.id]
    }

    /// Whether either side is the given image
    pub fn contains(&self, image_id: &str) -> bool {
        self.dark_image.id == image_id || self.light_image.id == image_id
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

fn darker_first(a: LibraryImage, b: LibraryImage) -> (LibraryImage, LibraryImage) {
    let a_is_dark = match a
        .features
        .mean_luminance
        .total_cmp(&b.features.mean_luminance)
    {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => a.id <= b.id,
    };
    if a_is_dark {
        (a, b)
    } else {
        (b, a)
    }
}

/// A borderline pair waiting for a human decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Same as `pair.id`
    pub id: String,
    pub pair: LibraryPair,
    pub reason: String,
}

impl ReviewItem {
    pub fn new(pair: LibraryPair) -> Self {
        Self {
            id: pair.id.clone(),
            reason: pair.reason.clone(),
            pair,
        }
    }
}

/// Full state of a screenshot library.
///
/// Every image id sits in exactly one of `pairs`, `review_pairs` or
/// `unmatched_image_ids`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySession {
    pub images: Vec<LibraryImage>,
    pub pairs: Vec<LibraryPair>,
    pub review_pairs: Vec<ReviewItem>,
    pub unmatched_image_ids: Vec<String>,
    /// Number of append batches applied so far
    #[serde(default)]
    pub append_batches: u32,
}

impl LibrarySession {
    /// An empty session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self, image_id: &str) -> Option<&LibraryImage> {
        self.images.iter().find(|image| image.id == image_id)
    }

    pub fn pair(&self, pair_id: &str) -> Option<&LibraryPair> {
        self.pairs.iter().find(|pair| pair.id == pair_id)
    }

    pub fn review_item(&self, review_id: &str) -> Option<&ReviewItem> {
        self.review_pairs.iter().find(|item| item.id == review_id)
    }

    pub fn is_unmatched(&self, image_id: &str) -> bool {
        self.unmatched_image_ids.iter().any(|id| id == image_id)
    }

    /// Unmatched images in session order
    pub fn unmatched_images(&self) -> Vec<&LibraryImage> {
        let unmatched: HashSet<&str> =
            self.unmatched_image_ids.iter().map(String::as_str).collect();
        self.images
            .iter()
            .filter(|image| unmatched.contains(image.id.as_str()))
            .collect()
    }

    /// Number of pairs whose editing is finished
    pub fn completed_count(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.is_completed()).count()
    }

    /// Check every session invariant, reporting the first violation
    pub fn validate(&self) -> Result<(), SessionError> {
        let mut known = HashSet::new();
        for image in &self.images {
            if !known.insert(image.id.as_str()) {
                return Err(SessionError::DuplicateImageId {
                    image_id: image.id.clone(),
                });
            }
        }

        let mut pair_ids = HashSet::new();
        let pair_list = self
            .pairs
            .iter()
            .chain(self.review_pairs.iter().map(|item| &item.pair));
        let mut claimed: HashSet<&str> = HashSet::new();

        for pair in pair_list {
            if !pair_ids.insert(pair.id.as_str()) {
                return Err(SessionError::DuplicatePairId {
                    pair_id: pair.id.clone(),
                });
            }
            for image_id in pair.image_ids() {
                if !known.contains(image_id) {
                    return Err(SessionError::UnknownImage {
                        image_id: image_id.to_string(),
                    });
                }
                if !claimed.insert(image_id) {
                    return Err(SessionError::DuplicateMembership {
                        image_id: image_id.to_string(),
                    });
                }
            }
        }

        for image_id in &self.unmatched_image_ids {
            if !known.contains(image_id.as_str()) {
                return Err(SessionError::UnknownImage {
                    image_id: image_id.clone(),
                });
            }
            if !claimed.insert(image_id.as_str()) {
                return Err(SessionError::DuplicateMembership {
                    image_id: image_id.clone(),
                });
            }
        }

        if let Some(orphan) = self
            .images
            .iter()
            .find(|image| !claimed.contains(image.id.as_str()))
        {
            return Err(SessionError::OrphanImage {
                image_id: orphan.id.clone(),
            });
        }

        Ok(())
    }

    /// Rebuild a consistent session from possibly inconsistent state.
    ///
    /// Keeps the first image per id and the first pair claiming each image
    /// (committed pairs before review items). Kept pairs get fresh copies of
    /// the images they reference. Everything else that is still an image ends
    /// up unmatched.
    pub fn repaired(self) -> Self {
        let mut images = Vec::with_capacity(self.images.len());
        let mut by_id: HashMap<String, usize> = HashMap::new();
        for image in self.images {
            if !by_id.contains_key(&image.id) {
                by_id.insert(image.id.clone(), images.len());
                images.push(image);
            }
        }

        let mut claimed: HashSet<String> = HashSet::new();
        let mut pair_ids: HashSet<String> = HashSet::new();
        let mut keep = |pair: &LibraryPair| -> bool {
            let ids = pair.image_ids();
            let valid = ids[0] != ids[1]
                && ids
                    .iter()
                    .all(|id| by_id.contains_key(*id) && !claimed.contains(*id))
                && !pair_ids.contains(&pair.id);
            if valid {
                pair_ids.insert(pair.id.clone());
                claimed.extend(ids.iter().map(|id| id.to_string()));
            }
            valid
        };

        let pairs: Vec<LibraryPair> = self
            .pairs
            .into_iter()
            .filter(|p| keep(p))
            .map(|pair| with_canonical_images(pair, &images, &by_id))
            .collect();
        let review_pairs: Vec<ReviewItem> = self
            .review_pairs
            .into_iter()
            .filter(|item| item.id == item.pair.id && keep(&item.pair))
            .map(|mut item| {
                item.pair = with_canonical_images(item.pair, &images, &by_id);
                item
            })
            .collect();

        let unmatched_image_ids = images
            .iter()
            .filter(|image| !claimed.contains(&image.id))
            .map(|image| image.id.clone())
            .collect();

        Self {
            images,
            pairs,
            review_pairs,
            unmatched_image_ids,
            append_batches: self.append_batches,
        }
    }
}

/// Replace a pair's embedded images with the session's own entries.
///
/// Both ids must be in `by_id`.
fn with_canonical_images(
    pair: LibraryPair,
    images: &[LibraryImage],
    by_id: &HashMap<String, usize>,
) -> LibraryPair {
    let canonical = |id: &str| by_id.get(id).map(|&index| images[index].clone());
    let (Some(a), Some(b)) = (
        canonical(&pair.dark_image.id),
        canonical(&pair.light_image.id),
    ) else {
        return pair;
    };

    let (dark_image, light_image) = darker_first(a, b);
    LibraryPair {
        dark_image,
        light_image,
        ..pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::EdgeHash;

    fn image(id: &str, luminance: f64) -> LibraryImage {
        LibraryImage {
            id: id.to_string(),
            file_name: format!("{}.png", id),
            source: format!("/screens/{}.png", id),
            features: ImageFeatures {
                width: 10,
                height: 20,
                aspect_ratio: 0.5,
                mean_luminance: luminance,
                grayscale_thumbnail: Vec::new(),
                edge_map: Vec::new(),
                edge_hash: EdgeHash::default(),
            },
        }
    }

    #[test]
    fn pair_id_is_order_independent() {
        assert_eq!(pair_id("a", "b"), pair_id("b", "a"));
        assert_ne!(pair_id("a", "b"), pair_id("a", "c"));
    }

    #[test]
    fn pair_puts_darker_image_first() {
        let pair = LibraryPair::new(
            image("light", 220.0),
            image("dark", 20.0),
            0.9,
            PairStatus::Auto,
            "high match",
        );
        assert_eq!(pair.dark_image.id, "dark");
        assert_eq!(pair.light_image.id, "light");
        assert_eq!(pair.id, pair_id("dark", "light"));
    }

    #[test]
    fn equal_luminance_falls_back_to_id_order() {
        let pair = LibraryPair::new(
            image("b", 100.0),
            image("a", 100.0),
            0.8,
            PairStatus::Auto,
            "borderline",
        );
        assert_eq!(pair.dark_image.id, "a");
    }

    #[test]
    fn review_item_shares_pair_id() {
        let pair = LibraryPair::new(
            image("a", 10.0),
            image("b", 200.0),
            0.75,
            PairStatus::Auto,
            "borderline",
        );
        let item = ReviewItem::new(pair);
        assert_eq!(item.id, item.pair.id);
        assert_eq!(item.reason, "borderline");
    }

    #[test]
    fn validate_accepts_consistent_session() {
        let session = LibrarySession {
            images: vec![image("a", 10.0), image("b", 200.0), image("c", 50.0)],
            pairs: vec![LibraryPair::new(
                image("a", 10.0),
                image("b", 200.0),
                0.9,
                PairStatus::Auto,
                "high match",
            )],
            review_pairs: Vec::new(),
            unmatched_image_ids: vec!["c".to_string()],
            append_batches: 0,
        };
        assert!(session.validate().is_ok());
    }

    #[test]
    fn validate_reports_orphans() {
        let session = LibrarySession {
            images: vec![image("a", 10.0)],
            ..Default::default()
        };
        assert_eq!(
            session.validate(),
            Err(SessionError::OrphanImage {
                image_id: "a".to_string()
            })
        );
    }

    #[test]
    fn validate_reports_double_membership() {
        let session = LibrarySession {
            images: vec![image("a", 10.0), image("b", 200.0)],
            pairs: vec![LibraryPair::new(
                image("a", 10.0),
                image("b", 200.0),
                0.9,
                PairStatus::Auto,
                "high match",
            )],
            review_pairs: Vec::new(),
            unmatched_image_ids: vec!["a".to_string()],
            append_batches: 0,
        };
        assert!(matches!(
            session.validate(),
            Err(SessionError::DuplicateMembership { .. })
        ));
    }

    #[test]
    fn repaired_drops_dangling_and_conflicting_pairs() {
        let session = LibrarySession {
            images: vec![image("a", 10.0), image("b", 200.0), image("c", 210.0)],
            pairs: vec![
                LibraryPair::new(
                    image("a", 10.0),
                    image("b", 200.0),
                    0.9,
                    PairStatus::Auto,
                    "high match",
                ),
                LibraryPair::new(
                    image("a", 10.0),
                    image("ghost", 200.0),
                    0.9,
                    PairStatus::Auto,
                    "high match",
                ),
            ],
            review_pairs: vec![ReviewItem::new(LibraryPair::new(
                image("a", 10.0),
                image("c", 210.0),
                0.75,
                PairStatus::Auto,
                "borderline",
            ))],
            unmatched_image_ids: vec!["a".to_string(), "a".to_string()],
            append_batches: 2,
        };

        let repaired = session.repaired();

        assert!(repaired.validate().is_ok());
        assert_eq!(repaired.pairs.len(), 1);
        assert!(repaired.review_pairs.is_empty());
        assert_eq!(repaired.unmatched_image_ids, vec!["c".to_string()]);
        assert_eq!(repaired.append_batches, 2);
    }

    #[test]
    fn repaired_replaces_stale_image_copies() {
        // The pair still carries an old copy of "b" that looked darker than "a"
        let mut stale = image("b", 5.0);
        stale.file_name = "old-name.png".to_string();
        let session = LibrarySession {
            images: vec![image("a", 10.0), image("b", 200.0)],
            pairs: vec![LibraryPair {
                id: pair_id("a", "b"),
                dark_image: stale,
                light_image: image("a", 10.0),
                score: 0.9,
                status: PairStatus::Manual,
                reason: "high match".to_string(),
                completed_at: None,
            }],
            ..Default::default()
        };

        let repaired = session.repaired();

        let pair = &repaired.pairs[0];
        assert_eq!(&pair.dark_image, repaired.image("a").unwrap());
        assert_eq!(&pair.light_image, repaired.image("b").unwrap());
        assert_eq!(pair.status, PairStatus::Manual);
        assert_eq!(pair.id, pair_id("a", "b"));
        assert!(repaired.validate().is_ok());
    }
}

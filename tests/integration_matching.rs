//! Integration tests for the pair matcher.
//!
//! These tests verify the matching guarantees end to end:
//! - No image is used twice, every image is accounted for
//! - Best candidates win, leftovers stay unmatched
//! - Borderline pairs go to review
//! - Results do not depend on input order

use std::collections::HashSet;
use theme_pair_matcher::core::features::{EdgeHash, ImageFeatures, EDGE_HASH_BYTES};
use theme_pair_matcher::core::matcher::{build_library_pairs, PairingResult};
use theme_pair_matcher::core::scorer::score_pair;
use theme_pair_matcher::core::session::{pair_id, LibraryImage, PairStatus};

fn image(id: &str, hash: [u8; EDGE_HASH_BYTES], luminance: f64) -> LibraryImage {
    LibraryImage {
        id: id.to_string(),
        file_name: format!("{}.png", id),
        source: format!("/screens/{}.png", id),
        features: ImageFeatures {
            width: 1170,
            height: 2532,
            aspect_ratio: 1170.0 / 2532.0,
            mean_luminance: luminance,
            grayscale_thumbnail: Vec::new(),
            edge_map: Vec::new(),
            edge_hash: EdgeHash::new(hash),
        },
    }
}

/// A hash with `count` leading bytes bit-inverted
fn flipped(base: [u8; EDGE_HASH_BYTES], count: usize) -> [u8; EDGE_HASH_BYTES] {
    let mut hash = base;
    for byte in hash.iter_mut().take(count) {
        *byte = !*byte;
    }
    hash
}

fn all_ids(result: &PairingResult) -> Vec<String> {
    let mut ids = Vec::new();
    for pair in &result.auto_pairs {
        ids.extend(pair.image_ids().iter().map(|id| id.to_string()));
    }
    for item in &result.review_pairs {
        ids.extend(item.pair.image_ids().iter().map(|id| id.to_string()));
    }
    ids.extend(result.unmatched_image_ids.iter().cloned());
    ids
}

fn pair_ids(result: &PairingResult) -> HashSet<String> {
    result
        .auto_pairs
        .iter()
        .map(|pair| pair.id.clone())
        .chain(result.review_pairs.iter().map(|item| item.id.clone()))
        .collect()
}

fn mixed_library() -> Vec<LibraryImage> {
    let base = [0x3C; EDGE_HASH_BYTES];
    let other = [0xA5; EDGE_HASH_BYTES];
    vec![
        image("home-dark", base, 22.0),
        image("home-light", base, 236.0),
        image("home-light-copy", flipped(base, 2), 231.0),
        image("settings-dark", other, 30.0),
        image("settings-light", flipped(other, 6), 228.0),
        image("settings-dark-2", other, 28.0),
        image("profile-dark", flipped(base, 16), 25.0),
        image("stray", [0x00; EDGE_HASH_BYTES], 120.0),
    ]
}

#[test]
fn no_image_is_matched_twice_and_none_is_lost() {
    let images = mixed_library();
    let result = build_library_pairs(&images);

    let ids = all_ids(&result);
    let unique: HashSet<&String> = ids.iter().collect();

    assert_eq!(ids.len(), images.len(), "an image was used twice or lost");
    assert_eq!(unique.len(), images.len());
    for image in &images {
        assert!(unique.contains(&image.id));
    }
}

#[test]
fn odd_batch_leaves_one_image_unmatched() {
    let hash = [0x5A; EDGE_HASH_BYTES];
    let images = vec![
        image("d1", hash, 20.0),
        image("d2", hash, 24.0),
        image("l1", hash, 220.0),
        image("l2", hash, 226.0),
        image("l3", hash, 232.0),
    ];

    let result = build_library_pairs(&images);

    assert_eq!(result.auto_pairs.len(), 2);
    assert!(result.review_pairs.is_empty());
    assert_eq!(result.unmatched_image_ids.len(), 1);
    assert!(result.unmatched_image_ids[0].starts_with('l'));
}

#[test]
fn best_candidates_win_over_weaker_cross_pairs() {
    let h1 = [0x3C; EDGE_HASH_BYTES];
    let h2 = flipped(h1, 6);
    let images = vec![
        image("d1", h1, 20.0),
        image("d2", h2, 20.0),
        image("l1", h1, 230.0),
        image("l2", h2, 230.0),
    ];

    // the cross pairs are real candidates, just weaker ones
    assert!(score_pair(&images[0].features, &images[3].features) >= 0.70);

    let result = build_library_pairs(&images);

    let expected: HashSet<String> = [pair_id("d1", "l1"), pair_id("d2", "l2")]
        .into_iter()
        .collect();
    assert_eq!(pair_ids(&result), expected);
    assert!(result.review_pairs.is_empty());
    assert!(result
        .auto_pairs
        .iter()
        .all(|pair| pair.status == PairStatus::Auto && pair.reason == "high match"));
}

#[test]
fn borderline_pair_goes_to_review() {
    let base = [0x3C; EDGE_HASH_BYTES];
    let images = vec![
        image("dark", base, 70.0),
        image("light", flipped(base, 8), 170.0),
    ];

    let result = build_library_pairs(&images);

    assert!(result.auto_pairs.is_empty());
    assert_eq!(result.review_pairs.len(), 1);
    let item = &result.review_pairs[0];
    assert_eq!(item.reason, "borderline");
    assert_eq!(item.id, item.pair.id);
    assert_eq!(item.pair.dark_image.id, "dark");
    assert!(item.pair.score >= 0.70 && item.pair.score < 0.85);
}

#[test]
fn borderline_routing_holds_at_moderate_gaps() {
    let base = [0x3C; EDGE_HASH_BYTES];
    for gap in [50.0, 60.0, 80.0] {
        let images = vec![
            image("dark", base, 60.0),
            image("light", flipped(base, 8), 60.0 + gap),
        ];

        let result = build_library_pairs(&images);

        assert!(result.auto_pairs.is_empty(), "gap {}", gap);
        assert_eq!(result.review_pairs.len(), 1, "gap {}", gap);
        assert_eq!(result.review_pairs[0].reason, "borderline");
        assert!(result.unmatched_image_ids.is_empty(), "gap {}", gap);
    }
}

#[test]
fn same_theme_duplicates_are_not_paired() {
    let hash = [0x3C; EDGE_HASH_BYTES];
    let images = vec![image("a", hash, 30.0), image("b", hash, 35.0)];

    let result = build_library_pairs(&images);

    assert!(result.auto_pairs.is_empty());
    assert!(result.review_pairs.is_empty());
    assert_eq!(result.unmatched_image_ids, vec!["a", "b"]);
}

#[test]
fn mismatched_aspect_ratio_disqualifies() {
    let hash = [0x3C; EDGE_HASH_BYTES];
    let phone = image("phone", hash, 20.0);
    let mut tablet = image("tablet", hash, 230.0);
    tablet.features.width = 2048;
    tablet.features.height = 2732;
    tablet.features.aspect_ratio = 2048.0 / 2732.0;

    assert_eq!(score_pair(&phone.features, &tablet.features), 0.0);
    assert!(build_library_pairs(&[phone, tablet]).auto_pairs.is_empty());
}

#[test]
fn pairing_does_not_depend_on_input_order() {
    let images = mixed_library();
    let mut reversed = images.clone();
    reversed.reverse();

    let forward = build_library_pairs(&images);
    let backward = build_library_pairs(&reversed);

    assert_eq!(pair_ids(&forward), pair_ids(&backward));
    assert_eq!(forward.auto_pairs.len(), backward.auto_pairs.len());
}

#[test]
fn unmatched_ids_keep_input_order() {
    let images = vec![
        image("z", [0x00; EDGE_HASH_BYTES], 30.0),
        image("a", [0xFF; EDGE_HASH_BYTES], 40.0),
        image("m", [0x0F; EDGE_HASH_BYTES], 50.0),
    ];

    let result = build_library_pairs(&images);

    assert_eq!(result.unmatched_image_ids, vec!["z", "a", "m"]);
}

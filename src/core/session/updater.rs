//! Pure state transitions on a `LibrarySession`.
//!
//! Every function takes the current session by reference and returns the
//! next one. Stale or unknown ids return an unchanged clone.

use super::types::{ImageUpload, LibraryImage, LibrarySession, PairStatus};
use crate::core::matcher::PairMatcher;
use crate::events::{null_sender, EventSender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Which images an append recomputes over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppendMode {
    /// Match new images against the unmatched pool only
    #[default]
    UnmatchedOnly,
    /// Also return auto pairs and review items that are not completed to the pool
    ReleaseIncomplete,
}

/// Build a fresh session from decoded uploads (ids `img-1`, `img-2`, ...)
pub fn create_session(uploads: Vec<ImageUpload>) -> LibrarySession {
    create_session_with(uploads, &PairMatcher::default(), &null_sender())
}

/// Build a fresh session with a specific matcher
pub fn create_session_with(
    uploads: Vec<ImageUpload>,
    matcher: &PairMatcher,
    events: &EventSender,
) -> LibrarySession {
    let images: Vec<LibraryImage> = uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| upload.into_image(format!("img-{}", index + 1)))
        .collect();

    let result = matcher.match_images_with_events(&images, events);

    info!(
        images = images.len(),
        pairs = result.auto_pairs.len(),
        review = result.review_pairs.len(),
        "Created session"
    );

    LibrarySession {
        images,
        pairs: result.auto_pairs,
        review_pairs: result.review_pairs,
        unmatched_image_ids: result.unmatched_image_ids,
        append_batches: 0,
    }
}

/// Promote a review item to a manual pair
pub fn accept_review_pair(session: &LibrarySession, review_id: &str) -> LibrarySession {
    let Some(index) = session.review_pairs.iter().position(|item| item.id == review_id) else {
        debug!(review_id, "Accept ignored: unknown review item");
        return session.clone();
    };

    let mut next = session.clone();
    let item = next.review_pairs.remove(index);
    let mut pair = item.pair;
    pair.status = PairStatus::Manual;

    debug!(pair_id = %pair.id, "Accepted review pair");
    next.pairs.push(pair);
    next
}

/// Drop a review item, returning both images to unmatched
pub fn reject_review_pair(session: &LibrarySession, review_id: &str) -> LibrarySession {
    let Some(index) = session.review_pairs.iter().position(|item| item.id == review_id) else {
        debug!(review_id, "Reject ignored: unknown review item");
        return session.clone();
    };

    let mut next = session.clone();
    let item = next.review_pairs.remove(index);
    release(&mut next.unmatched_image_ids, item.pair.image_ids());

    debug!(review_id, "Rejected review pair");
    next
}

/// Dissolve a pair, whatever its status or completion
pub fn unpair_library_pair(session: &LibrarySession, pair_id: &str) -> LibrarySession {
    let Some(index) = session.pairs.iter().position(|pair| pair.id == pair_id) else {
        debug!(pair_id, "Unpair ignored: unknown pair");
        return session.clone();
    };

    let mut next = session.clone();
    let pair = next.pairs.remove(index);
    release(&mut next.unmatched_image_ids, pair.image_ids());

    debug!(pair_id, was_completed = pair.is_completed(), "Unpaired");
    next
}

/// Delete images from the session.
///
/// Pairs and review items touching a deleted image are dissolved and their
/// surviving partner becomes unmatched.
pub fn remove_images_from_session<S: AsRef<str>>(
    session: &LibrarySession,
    image_ids: &[S],
) -> LibrarySession {
    let doomed: HashSet<&str> = image_ids
        .iter()
        .map(|id| id.as_ref())
        .filter(|id| session.image(id).is_some())
        .collect();

    if doomed.is_empty() {
        debug!("Remove ignored: no known image ids");
        return session.clone();
    }

    let mut next = LibrarySession {
        images: Vec::with_capacity(session.images.len()),
        pairs: Vec::with_capacity(session.pairs.len()),
        review_pairs: Vec::with_capacity(session.review_pairs.len()),
        unmatched_image_ids: session
            .unmatched_image_ids
            .iter()
            .filter(|id| !doomed.contains(id.as_str()))
            .cloned()
            .collect(),
        append_batches: session.append_batches,
    };

    next.images = session
        .images
        .iter()
        .filter(|image| !doomed.contains(image.id.as_str()))
        .cloned()
        .collect();

    let mut survivors = Vec::new();
    for pair in &session.pairs {
        let ids = pair.image_ids();
        if ids.iter().any(|id| doomed.contains(id)) {
            survivors.extend(ids.into_iter().filter(|id| !doomed.contains(id)));
        } else {
            next.pairs.push(pair.clone());
        }
    }
    for item in &session.review_pairs {
        let ids = item.pair.image_ids();
        if ids.iter().any(|id| doomed.contains(id)) {
            survivors.extend(ids.into_iter().filter(|id| !doomed.contains(id)));
        } else {
            next.review_pairs.push(item.clone());
        }
    }
    next.unmatched_image_ids
        .extend(survivors.into_iter().map(String::from));

    info!(
        removed = doomed.len(),
        remaining = next.images.len(),
        "Removed images from session"
    );
    next
}

/// Add new images and rematch the pool with the default matcher
pub fn append_and_recompute_session(
    session: &LibrarySession,
    uploads: Vec<ImageUpload>,
    mode: AppendMode,
) -> LibrarySession {
    append_and_recompute_with(session, uploads, mode, &PairMatcher::default(), &null_sender())
}

/// Add new images and rematch the pool.
///
/// New images get ids `b{batch}-{n}`. Completed pairs are never touched.
pub fn append_and_recompute_with(
    session: &LibrarySession,
    uploads: Vec<ImageUpload>,
    mode: AppendMode,
    matcher: &PairMatcher,
    events: &EventSender,
) -> LibrarySession {
    let (batch, new_images) = assign_batch_ids(session, uploads);

    let mut next = session.clone();
    next.append_batches = batch;

    if mode == AppendMode::ReleaseIncomplete {
        let (kept, released): (Vec<_>, Vec<_>) = next
            .pairs
            .into_iter()
            .partition(|pair| pair.is_completed() || pair.status == PairStatus::Manual);
        next.pairs = kept;

        for pair in &released {
            release(&mut next.unmatched_image_ids, pair.image_ids());
        }
        for item in std::mem::take(&mut next.review_pairs) {
            release(&mut next.unmatched_image_ids, item.pair.image_ids());
        }
        debug!(released = released.len(), "Released incomplete pairs");
    }

    let pool_ids: HashSet<&str> = next
        .unmatched_image_ids
        .iter()
        .map(String::as_str)
        .collect();
    let pool: Vec<LibraryImage> = next
        .images
        .iter()
        .filter(|image| pool_ids.contains(image.id.as_str()))
        .chain(new_images.iter())
        .cloned()
        .collect();

    let result = matcher.match_images_with_events(&pool, events);

    info!(
        batch,
        added = new_images.len(),
        pool = pool.len(),
        new_pairs = result.auto_pairs.len(),
        new_review = result.review_pairs.len(),
        "Appended images"
    );

    next.images.extend(new_images);
    next.pairs.extend(result.auto_pairs);
    next.review_pairs.extend(result.review_pairs);
    next.unmatched_image_ids = result.unmatched_image_ids;
    next
}

/// Stamp a pair as finished in the editor
pub fn mark_pair_completed(
    session: &LibrarySession,
    pair_id: &str,
    at: DateTime<Utc>,
) -> LibrarySession {
    set_completed(session, pair_id, Some(at))
}

/// Clear a pair's completion stamp
pub fn clear_pair_completed(session: &LibrarySession, pair_id: &str) -> LibrarySession {
    set_completed(session, pair_id, None)
}

fn set_completed(
    session: &LibrarySession,
    pair_id: &str,
    completed_at: Option<DateTime<Utc>>,
) -> LibrarySession {
    let mut next = session.clone();
    match next.pairs.iter_mut().find(|pair| pair.id == pair_id) {
        Some(pair) => {
            pair.completed_at = completed_at;
            debug!(pair_id, completed = completed_at.is_some(), "Updated completion");
        }
        None => debug!(pair_id, "Completion ignored: unknown pair"),
    }
    next
}

/// Pick the next batch number whose ids do not collide with existing ones
fn assign_batch_ids(
    session: &LibrarySession,
    uploads: Vec<ImageUpload>,
) -> (u32, Vec<LibraryImage>) {
    let existing: HashSet<&str> = session
        .images
        .iter()
        .map(|image| image.id.as_str())
        .collect();
    let count = uploads.len();

    let mut batch = session.append_batches + 1;
    while (1..=count).any(|n| existing.contains(batch_id(batch, n).as_str())) {
        batch += 1;
    }

    let images = uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| upload.into_image(batch_id(batch, index + 1)))
        .collect();

    (batch, images)
}

fn batch_id(batch: u32, n: usize) -> String {
    format!("b{}-{}", batch, n)
}

fn release(unmatched: &mut Vec<String>, ids: [&str; 2]) {
    unmatched.extend(ids.iter().map(|id| id.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::{EdgeHash, ImageFeatures, EDGE_HASH_BYTES};
    use crate::core::session::{pair_id, LibraryPair, ReviewItem};
    use chrono::TimeZone;

    fn features(fill: u8, luminance: f64) -> ImageFeatures {
        ImageFeatures {
            width: 1170,
            height: 2532,
            aspect_ratio: 1170.0 / 2532.0,
            mean_luminance: luminance,
            grayscale_thumbnail: Vec::new(),
            edge_map: Vec::new(),
            edge_hash: EdgeHash::new([fill; EDGE_HASH_BYTES]),
        }
    }

    fn upload(name: &str, fill: u8, luminance: f64) -> ImageUpload {
        ImageUpload::new(
            format!("{}.png", name),
            format!("/screens/{}.png", name),
            features(fill, luminance),
        )
    }

    fn image(id: &str, luminance: f64) -> LibraryImage {
        upload(id, 0x3C, luminance).into_image(id.to_string())
    }

    fn borderline_session() -> LibrarySession {
        let pair = LibraryPair::new(
            image("a", 20.0),
            image("b", 220.0),
            0.75,
            PairStatus::Auto,
            "borderline",
        );
        LibrarySession {
            images: vec![image("a", 20.0), image("b", 220.0), image("c", 40.0)],
            pairs: Vec::new(),
            review_pairs: vec![ReviewItem::new(pair)],
            unmatched_image_ids: vec!["c".to_string()],
            append_batches: 0,
        }
    }

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_session_assigns_sequential_ids() {
        let session = create_session(vec![
            upload("home-dark", 0x3C, 20.0),
            upload("home-light", 0x3C, 230.0),
        ]);

        let ids: Vec<_> = session.images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["img-1", "img-2"]);
        assert_eq!(session.pairs.len(), 1);
        assert!(session.validate().is_ok());
    }

    #[test]
    fn accept_promotes_review_item_to_manual_pair() {
        let session = borderline_session();
        let id = pair_id("a", "b");

        let next = accept_review_pair(&session, &id);

        assert!(next.review_pairs.is_empty());
        assert_eq!(next.pairs.len(), 1);
        assert_eq!(next.pairs[0].status, PairStatus::Manual);
        assert!(next.validate().is_ok());
        // input untouched
        assert_eq!(session.review_pairs.len(), 1);
    }

    #[test]
    fn reject_moves_both_images_to_unmatched() {
        let next = reject_review_pair(&borderline_session(), &pair_id("a", "b"));

        assert!(next.review_pairs.is_empty());
        assert!(next.is_unmatched("a"));
        assert!(next.is_unmatched("b"));
        assert!(next.validate().is_ok());
    }

    #[test]
    fn accept_then_unpair_round_trip() {
        let session = borderline_session();
        let id = pair_id("a", "b");

        let accepted = accept_review_pair(&session, &id);
        let completed = mark_pair_completed(&accepted, &id, when());
        let unpaired = unpair_library_pair(&completed, &id);

        assert!(unpaired.pairs.is_empty());
        assert!(unpaired.review_pairs.is_empty());
        assert_eq!(unpaired.unmatched_image_ids.len(), 3);
        assert!(unpaired.validate().is_ok());
    }

    #[test]
    fn unknown_ids_return_unchanged_session() {
        let session = borderline_session();

        assert_eq!(accept_review_pair(&session, "pair:x+y"), session);
        assert_eq!(reject_review_pair(&session, "pair:x+y"), session);
        assert_eq!(unpair_library_pair(&session, "pair:x+y"), session);
        assert_eq!(remove_images_from_session(&session, &["ghost"]), session);
        assert_eq!(mark_pair_completed(&session, "pair:x+y", when()), session);
    }

    #[test]
    fn removing_one_side_frees_the_partner() {
        let next = remove_images_from_session(&borderline_session(), &["a"]);

        assert!(next.image("a").is_none());
        assert!(next.review_pairs.is_empty());
        assert_eq!(next.unmatched_image_ids, vec!["c".to_string(), "b".to_string()]);
        assert!(next.validate().is_ok());
    }

    #[test]
    fn removing_an_unmatched_image() {
        let next = remove_images_from_session(&borderline_session(), &["c".to_string()]);

        assert_eq!(next.images.len(), 2);
        assert!(next.unmatched_image_ids.is_empty());
        assert_eq!(next.review_pairs.len(), 1);
    }

    #[test]
    fn completion_stamp_can_be_set_and_cleared() {
        let session = accept_review_pair(&borderline_session(), &pair_id("a", "b"));
        let id = pair_id("a", "b");

        let done = mark_pair_completed(&session, &id, when());
        assert_eq!(done.pair(&id).unwrap().completed_at, Some(when()));
        assert_eq!(done.completed_count(), 1);

        let cleared = clear_pair_completed(&done, &id);
        assert!(cleared.pair(&id).unwrap().completed_at.is_none());
    }

    #[test]
    fn append_matches_new_image_against_unmatched_pool() {
        let session = create_session(vec![upload("settings-dark", 0x3C, 20.0)]);
        assert_eq!(session.unmatched_image_ids, vec!["img-1".to_string()]);

        let next = append_and_recompute_session(
            &session,
            vec![upload("settings-light", 0x3C, 230.0)],
            AppendMode::UnmatchedOnly,
        );

        assert_eq!(next.append_batches, 1);
        assert_eq!(next.images[1].id, "b1-1");
        assert_eq!(next.pairs.len(), 1);
        assert!(next.unmatched_image_ids.is_empty());
        assert!(next.validate().is_ok());
    }

    #[test]
    fn append_preserves_completed_pairs() {
        let session = create_session(vec![
            upload("home-dark", 0x3C, 20.0),
            upload("home-light", 0x3C, 230.0),
        ]);
        let id = session.pairs[0].id.clone();
        let completed = mark_pair_completed(&session, &id, when());

        // a better-looking partner for img-1 arrives
        for mode in [AppendMode::UnmatchedOnly, AppendMode::ReleaseIncomplete] {
            let next = append_and_recompute_session(
                &completed,
                vec![upload("home-light-2", 0x3C, 240.0)],
                mode,
            );

            let kept = next.pair(&id).unwrap();
            assert_eq!(kept.completed_at, Some(when()));
            assert_eq!(kept, completed.pair(&id).unwrap());
            assert_eq!(next.unmatched_image_ids, vec!["b1-1".to_string()]);
            assert!(next.validate().is_ok());
        }
    }

    #[test]
    fn release_incomplete_rematches_open_pairs() {
        let session = create_session(vec![
            upload("dark", 0x3C, 20.0),
            upload("light", 0x3C, 230.0),
        ]);

        let unmatched_only = append_and_recompute_session(
            &session,
            vec![upload("other-dark", 0x3C, 30.0)],
            AppendMode::UnmatchedOnly,
        );
        assert_eq!(unmatched_only.pairs, session.pairs);

        let released = append_and_recompute_session(
            &session,
            vec![upload("other-dark", 0x3C, 30.0)],
            AppendMode::ReleaseIncomplete,
        );
        assert_eq!(released.pairs.len(), 1);
        assert_eq!(released.unmatched_image_ids.len(), 1);
        assert!(released.validate().is_ok());
    }

    #[test]
    fn batch_ids_skip_collisions() {
        let mut session = create_session(vec![upload("a", 0x3C, 20.0)]);
        session.images[0].id = "b1-1".to_string();
        session.unmatched_image_ids = vec!["b1-1".to_string()];

        let next = append_and_recompute_session(
            &session,
            vec![upload("b", 0xFF, 20.0)],
            AppendMode::UnmatchedOnly,
        );

        assert_eq!(next.append_batches, 2);
        assert_eq!(next.images[1].id, "b2-1");
    }
}

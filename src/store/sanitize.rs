//! Fixed-schema readers for persisted JSON.
//!
//! Fields with the wrong shape are dropped and replaced by defaults. The
//! result is always usable, whatever was on disk.

use super::preferences::{Confirmations, ExportFormat, Preferences, Region, Template};
use crate::core::session::{LibraryImage, LibraryPair, LibrarySession, ReviewItem};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Rebuild a session from arbitrary JSON.
///
/// Malformed images, pairs and review items are skipped individually, then
/// the session is repaired so every image sits in exactly one bucket.
pub fn sanitize_session(value: &Value) -> LibrarySession {
    let Some(object) = value.as_object() else {
        debug!("Session is not a JSON object, using empty session");
        return LibrarySession::default();
    };

    let images: Vec<LibraryImage> = valid_items(object.get("images"))
        .into_iter()
        .filter(|image: &LibraryImage| {
            image.features.width > 0
                && image.features.height > 0
                && image.features.mean_luminance.is_finite()
        })
        .collect();

    let pairs: Vec<LibraryPair> = valid_items(object.get("pairs"))
        .into_iter()
        .filter_map(sanitize_pair)
        .collect();

    let review_pairs: Vec<ReviewItem> = valid_items(object.get("reviewPairs"))
        .into_iter()
        .filter_map(|item: ReviewItem| {
            let pair = sanitize_pair(item.pair)?;
            Some(ReviewItem {
                id: pair.id.clone(),
                reason: item.reason,
                pair,
            })
        })
        .collect();

    let unmatched_image_ids = object
        .get("unmatchedImageIds")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let append_batches = object
        .get("appendBatches")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);

    LibrarySession {
        images,
        pairs,
        review_pairs,
        unmatched_image_ids,
        append_batches,
    }
    .repaired()
}

/// Read preferences from arbitrary JSON, keeping every valid field
pub fn sanitize_preferences(value: &Value) -> Preferences {
    let mut preferences = Preferences::default();
    let Some(object) = value.as_object() else {
        return preferences;
    };

    if let Some(format) = object
        .get("exportFormat")
        .and_then(Value::as_str)
        .and_then(ExportFormat::parse)
    {
        preferences.export_format = format;
    }

    if let Some(confirmations) = object.get("confirmations").and_then(Value::as_object) {
        let flag = |key: &str| {
            confirmations
                .get(key)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        preferences.confirmations = Confirmations {
            skip_delete: flag("skipDelete"),
            skip_unpair: flag("skipUnpair"),
            skip_reset: flag("skipReset"),
        };
    }

    if let Some(templates) = object.get("templates").and_then(Value::as_array) {
        preferences.templates = templates.iter().filter_map(sanitize_template).collect();
    }

    preferences
}

fn sanitize_template(value: &Value) -> Option<Template> {
    let object = value.as_object()?;
    let name = object.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let regions = object
        .get("regions")
        .and_then(Value::as_array)
        .map(|regions| {
            regions
                .iter()
                .filter_map(|region| serde_json::from_value::<Region>(region.clone()).ok())
                .filter(Region::is_valid)
                .collect()
        })
        .unwrap_or_default();

    Some(Template {
        name: name.to_string(),
        regions,
    })
}

fn sanitize_pair(mut pair: LibraryPair) -> Option<LibraryPair> {
    if !pair.score.is_finite() || pair.dark_image.id == pair.light_image.id {
        return None;
    }
    pair.score = pair.score.clamp(0.0, 1.0);
    pair.id = crate::core::session::pair_id(&pair.dark_image.id, &pair.light_image.id);
    Some(pair)
}

/// Deserialize each array element on its own, skipping the bad ones
fn valid_items<T: DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let parsed: Vec<T> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();

    if parsed.len() != items.len() {
        debug!(
            dropped = items.len() - parsed.len(),
            "Dropped malformed entries"
        );
    }
    parsed
}

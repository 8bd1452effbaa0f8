//! # Features Module
//!
//! Converts decoded RGBA pixels into a compact, comparable feature record.
//!
//! ## What Gets Extracted
//! - **Mean luminance** - alpha-weighted, tells dark themes from light ones
//! - **Grayscale thumbnail** - fixed 96x96 intensity grid
//! - **Edge map** - Sobel gradient magnitude over the thumbnail
//! - **Edge hash** - 256 bits marking edge-heavy cells of a 16x16 grid
//!
//! ## Example
//! ```rust,ignore
//! use theme_pair_matcher::core::features::extract_features;
//!
//! let features = extract_features(&rgba, width, height)?;
//! println!("{}", features.edge_hash);
//! ```

mod edge_hash;
mod extractor;
mod resize;

pub use edge_hash::{EdgeHash, EDGE_HASH_BITS, EDGE_HASH_BYTES};
pub use extractor::{
    extract_features, FeatureExtractor, EDGE_NOISE_FLOOR, HASH_GRID_SIZE, THUMBNAIL_SIZE,
};
pub use resize::ThumbnailResizer;

use serde::{Deserialize, Serialize};

/// Content-derived features of one image.
///
/// A pure function of the pixel buffer and its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFeatures {
    pub width: u32,
    pub height: u32,
    /// `width / height`
    pub aspect_ratio: f64,
    /// Alpha-weighted mean luminance in [0, 255]
    pub mean_luminance: f64,
    /// Row-major `THUMBNAIL_SIZE x THUMBNAIL_SIZE` intensities
    pub grayscale_thumbnail: Vec<u8>,
    /// Row-major gradient magnitudes, same grid as the thumbnail
    pub edge_map: Vec<f32>,
    pub edge_hash: EdgeHash,
}

impl ImageFeatures {
    /// Whether this image reads as a dark theme (mean luminance below mid-gray)
    pub fn is_dark(&self) -> bool {
        self.mean_luminance < 128.0
    }
}

//! # Scanner Module
//!
//! Discovers screenshot files in directories.
//!
//! ## Supported Formats
//! - PNG (.png)
//! - JPEG (.jpg, .jpeg)
//! - WebP (.webp)
//! - GIF (.gif), first frame only
//! - BMP (.bmp)
//!
//! ## Example
//! ```rust,ignore
//! use theme_pair_matcher::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let found = scanner.scan(&["/Users/me/Screenshots".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A discovered image file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    pub format: ImageFormat,
}

impl ImageFile {
    /// File name shown to users, falling back to the full path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Image formats the loader can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => ImageFormat::Png,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "webp" => ImageFormat::WebP,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered images, sorted by path within each root
    pub images: Vec<ImageFile>,
    /// Non-fatal errors
    pub errors: Vec<ScanError>,
}

/// Trait for image scanners
///
/// Implement this trait to feed the pipeline from another source (e.g. in tests).
pub trait ImageScanner: Send + Sync {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("WebP"), ImageFormat::WebP);
    }

    #[test]
    fn unknown_extension_is_not_supported() {
        assert_eq!(ImageFormat::from_extension("heic"), ImageFormat::Unknown);
        assert!(!ImageFormat::from_extension("pdf").is_supported());
        assert!(ImageFormat::Png.is_supported());
    }

    #[test]
    fn file_name_uses_last_component() {
        let file = ImageFile {
            path: PathBuf::from("/shots/app/settings-dark.png"),
            size: 10,
            format: ImageFormat::Png,
        };
        assert_eq!(file.file_name(), "settings-dark.png");
    }
}

//! Decodes image files and turns them into uploads.

use crate::core::features::FeatureExtractor;
use crate::core::scanner::ImageFile;
use crate::core::session::ImageUpload;
use crate::error::LoadError;
use std::path::Path;

/// Decode a file into an RGBA8 buffer and its dimensions
pub fn decode_rgba(path: &Path) -> Result<(Vec<u8>, u32, u32), LoadError> {
    let decoded = image::open(path).map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((rgba.into_raw(), width, height))
}

/// Decode a discovered file and extract its features
pub fn load_upload(
    file: &ImageFile,
    extractor: &mut FeatureExtractor,
) -> Result<ImageUpload, LoadError> {
    let (pixels, width, height) = decode_rgba(&file.path)?;

    let features = extractor
        .extract(&pixels, width, height)
        .map_err(|source| LoadError::Features {
            path: file.path.clone(),
            source,
        })?;

    Ok(ImageUpload::new(
        file.file_name(),
        file.path.display().to_string(),
        features,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::ImageFormat;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn image_file(path: &Path) -> ImageFile {
        ImageFile {
            path: path.to_path_buf(),
            size: 0,
            format: ImageFormat::Png,
        }
    }

    #[test]
    fn decodes_png_to_rgba() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("white.png");
        RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let (pixels, width, height) = decode_rgba(&path).unwrap();

        assert_eq!((width, height), (8, 4));
        assert_eq!(pixels.len(), 8 * 4 * 4);
    }

    #[test]
    fn load_upload_keeps_file_name_and_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("home-dark.png");
        RgbaImage::from_pixel(10, 20, Rgba([20, 20, 20, 255]))
            .save(&path)
            .unwrap();

        let upload = load_upload(&image_file(&path), &mut FeatureExtractor::new()).unwrap();

        assert_eq!(upload.file_name, "home-dark.png");
        assert_eq!(upload.source, path.display().to_string());
        assert!(upload.features.is_dark());
        assert!((upload.features.aspect_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn undecodable_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = load_upload(&image_file(&path), &mut FeatureExtractor::new()).unwrap_err();

        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(err.to_string().contains("broken.png"));
    }
}

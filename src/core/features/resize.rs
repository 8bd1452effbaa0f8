//! Fast SIMD-accelerated thumbnail resizing.
//!
//! Uses fast_image_resize, which picks AVX2/NEON code paths when available.

use crate::error::FeatureError;
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};

/// Resizes single-channel intensity buffers to the fixed thumbnail grid
pub struct ThumbnailResizer {
    resizer: Resizer,
}

impl ThumbnailResizer {
    /// Create a new resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize a row-major `u8` intensity buffer to `size x size`.
    ///
    /// Works for both downscaling and upscaling; tiny images are stretched.
    pub fn resize_square(
        &mut self,
        intensity: Vec<u8>,
        width: u32,
        height: u32,
        size: u32,
    ) -> Result<Vec<u8>, FeatureError> {
        if width == 0 || height == 0 {
            return Err(FeatureError::ZeroDimensions { width, height });
        }

        let src_image = Image::from_vec_u8(width, height, intensity, PixelType::U8)
            .map_err(|e| FeatureError::Resize(format!("Failed to create source image: {}", e)))?;

        let mut dst_image = Image::new(size, size, PixelType::U8);

        // Bilinear has no negative lobes, so flat regions stay flat
        let options = ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| FeatureError::Resize(format!("Resize failed: {}", e)))?;

        Ok(dst_image.into_vec())
    }
}

impl Default for ThumbnailResizer {
    fn default() -> Self {
        Self::new()
    }
}

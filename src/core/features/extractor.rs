//! Feature extraction from raw RGBA buffers.
//!
//! The extractor works by:
//! 1. Computing the alpha-weighted Rec. 709 mean luminance
//! 2. Resizing alpha-premultiplied luminance to a 96x96 thumbnail
//! 3. Running a Sobel operator over the thumbnail (edge map)
//! 4. Pooling the edge map into a 16x16 grid and keeping the upper half of
//!    cells, ranked by edge energy and then by distance to the nearest edges
//!
//! Step 4 only looks at *where* edges are, not at how bright either side is,
//! so a dark-mode and a light-mode render of one layout hash the same.

use super::edge_hash::EdgeHash;
use super::resize::ThumbnailResizer;
use super::ImageFeatures;
use crate::error::FeatureError;
use std::cmp::Ordering;
use tracing::debug;

/// Side length of the grayscale thumbnail and edge map
pub const THUMBNAIL_SIZE: u32 = 96;

/// Side length of the pooled grid that becomes the edge hash
pub const HASH_GRID_SIZE: u32 = 16;

/// Sobel magnitudes below this are resampling noise, not edges
pub const EDGE_NOISE_FLOOR: f32 = 16.0;

const LUMA_R: f64 = 0.2126;
const LUMA_G: f64 = 0.7152;
const LUMA_B: f64 = 0.0722;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Extracts [`ImageFeatures`] from decoded pixels.
///
/// Holds a reusable resizer; create one per thread.
pub struct FeatureExtractor {
    resizer: ThumbnailResizer,
}

impl FeatureExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self {
            resizer: ThumbnailResizer::new(),
        }
    }

    /// Compute features for an RGBA8 buffer of `width x height` pixels
    pub fn extract(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<ImageFeatures, FeatureError> {
        if width == 0 || height == 0 {
            return Err(FeatureError::ZeroDimensions { width, height });
        }

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(FeatureError::BufferLength {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        let (mean_luminance, intensity) = luminance_planes(pixels);

        let grayscale_thumbnail =
            self.resizer
                .resize_square(intensity, width, height, THUMBNAIL_SIZE)?;

        let edge_map = sobel_magnitude(&grayscale_thumbnail, THUMBNAIL_SIZE as usize);
        let edge_hash = hash_edge_map(&edge_map, THUMBNAIL_SIZE as usize);

        debug!(
            width,
            height,
            mean_luminance,
            edge_bits = edge_hash.ones(),
            "Extracted image features"
        );

        Ok(ImageFeatures {
            width,
            height,
            aspect_ratio: width as f64 / height as f64,
            mean_luminance,
            grayscale_thumbnail,
            edge_map,
            edge_hash,
        })
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off extraction
pub fn extract_features(
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<ImageFeatures, FeatureError> {
    FeatureExtractor::new().extract(pixels, width, height)
}

/// Returns the alpha-weighted mean luminance and a per-pixel intensity plane
/// (luminance premultiplied by alpha).
fn luminance_planes(pixels: &[u8]) -> (f64, Vec<u8>) {
    let mut weighted_sum = 0.0f64;
    let mut total_weight = 0.0f64;
    let mut intensity = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let luma = LUMA_R * px[0] as f64 + LUMA_G * px[1] as f64 + LUMA_B * px[2] as f64;
        let alpha = px[3] as f64;

        if px[3] > 0 {
            weighted_sum += luma * alpha;
            total_weight += alpha;
        }

        intensity.push((luma * alpha / 255.0).round().clamp(0.0, 255.0) as u8);
    }

    let mean = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };

    (mean, intensity)
}

/// Sobel gradient magnitude with border clamping.
fn sobel_magnitude(gray: &[u8], size: usize) -> Vec<f32> {
    let mut magnitude = vec![0.0f32; size * size];
    let at = |x: usize, y: usize| gray[y * size + x] as f32;

    for y in 0..size {
        let ys = [y.saturating_sub(1), y, (y + 1).min(size - 1)];
        for x in 0..size {
            let xs = [x.saturating_sub(1), x, (x + 1).min(size - 1)];

            let mut gx = 0.0f32;
            let mut gy = 0.0f32;
            for (ky, &yy) in ys.iter().enumerate() {
                for (kx, &xx) in xs.iter().enumerate() {
                    let value = at(xx, yy);
                    gx += value * SOBEL_KERNEL_X[ky][kx];
                    gy += value * SOBEL_KERNEL_Y[ky][kx];
                }
            }

            let mag = (gx * gx + gy * gy).sqrt();
            magnitude[y * size + x] = if mag < EDGE_NOISE_FLOOR { 0.0 } else { mag };
        }
    }

    magnitude
}

/// Pool the edge map into `HASH_GRID_SIZE` cells and set a bit for the upper
/// half of cells.
///
/// Cells rank by mean magnitude first. Cells without edges then rank by their
/// reach, so a sparse screen still gets a half-full hash that says where its
/// content sits instead of a row of shared zeros.
fn hash_edge_map(edge_map: &[f32], size: usize) -> EdgeHash {
    let cells = pool_cells(edge_map, size);
    let reach = edge_reach(&cells);
    let keys: Vec<CellKey> = cells.into_iter().zip(reach).collect();

    let threshold = lower_median(&keys);
    let bits = keys
        .iter()
        .map(|key| compare_keys(key, &threshold).is_gt());
    EdgeHash::from_bits(bits)
}

/// (mean magnitude, reach) of one grid cell
type CellKey = (f32, f32);

fn pool_cells(edge_map: &[f32], size: usize) -> Vec<f32> {
    let grid = HASH_GRID_SIZE as usize;
    let cell = size / grid;
    let mut cells = Vec::with_capacity(grid * grid);

    for gy in 0..grid {
        for gx in 0..grid {
            let mut sum = 0.0f32;
            for y in gy * cell..(gy + 1) * cell {
                let row = &edge_map[y * size + gx * cell..y * size + (gx + 1) * cell];
                sum += row.iter().sum::<f32>();
            }
            cells.push(sum / (cell * cell) as f32);
        }
    }

    cells
}

/// Edge energy of every cell spread over the grid with `1 / (1 + d^2)` falloff.
///
/// Scaling every magnitude by the same contrast factor scales every reach by
/// it too, so the ranking survives a theme flip.
fn edge_reach(cells: &[f32]) -> Vec<f32> {
    let grid = HASH_GRID_SIZE as usize;
    let sources: Vec<(usize, usize, f32)> = cells
        .iter()
        .enumerate()
        .filter(|&(_, &value)| value > 0.0)
        .map(|(index, &value)| (index / grid, index % grid, value))
        .collect();

    (0..cells.len())
        .map(|index| {
            let (y, x) = (index / grid, index % grid);
            sources
                .iter()
                .map(|&(sy, sx, value)| {
                    let dy = y.abs_diff(sy) as f32;
                    let dx = x.abs_diff(sx) as f32;
                    value / (1.0 + dy * dy + dx * dx)
                })
                .sum()
        })
        .collect()
}

fn compare_keys(a: &CellKey, b: &CellKey) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}

/// Lower middle key; keys strictly above it are the upper half
fn lower_median(keys: &[CellKey]) -> CellKey {
    let mut sorted = keys.to_vec();
    sorted.sort_by(compare_keys);
    sorted[(sorted.len() - 1) / 2]
}

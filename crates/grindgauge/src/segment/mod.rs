//! Particle segmentation: contrast-normalize, denoise, binarize, mask and
//! morphologically clean the ROI into a binary particle mask.
//!
//! Stage order is fixed: contrast normalization, light blur, locally
//! adaptive threshold, exclusion zeroing, morphological opening. Exclusions
//! are zeroed *before* the opening so cleanup cannot bridge across an
//! excluded region.

mod clahe;

pub use clahe::clahe;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::Norm;
use serde::{Deserialize, Serialize};

use crate::region::RegionMask;

/// Local contrast normalization strategy.
///
/// The tiled adaptive variant is the default; the global fallback keeps
/// the same interface and differs only in robustness to uneven lighting.
/// An explicit config choice rather than a capability probe, so the two
/// behaviors stay individually testable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContrastMode {
    /// Contrast-limited adaptive histogram equalization.
    Clahe {
        /// Clip limit as a multiple of the mean histogram bin height.
        clip_limit: f32,
        /// Tile grid size per axis.
        tiles: u32,
    },
    /// Single global histogram equalization.
    GlobalEqualize,
}

/// Segmentation parameters.
///
/// Defaults mirror the tuned measurement pipeline: CLAHE 2.0 over 8x8
/// tiles, 3x3 denoise blur, 35x35 Gaussian-weighted local mean threshold
/// at offset 5, 3x3 elliptical opening. Gaussian kernel sizes are
/// expressed as sigmas (3 -> 0.8, 35 -> 5.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Contrast normalization strategy.
    pub contrast: ContrastMode,
    /// Pre-threshold denoising blur sigma (pixels).
    pub denoise_sigma: f32,
    /// Sigma of the local-background estimate for adaptive thresholding.
    pub background_sigma: f32,
    /// Offset subtracted from the local background; a pixel is foreground
    /// when at least this much darker than its surroundings.
    pub threshold_offset: f32,
    /// Radius of the elliptical opening kernel (1 = 3x3 cross).
    pub open_radius: u8,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            contrast: ContrastMode::Clahe {
                clip_limit: 2.0,
                tiles: 8,
            },
            denoise_sigma: 0.8,
            background_sigma: 5.6,
            threshold_offset: 5.0,
            open_radius: 1,
        }
    }
}

/// Display-only layers derived alongside the measurement mask.
#[derive(Debug, Clone)]
pub struct DiagnosticLayers {
    /// Mask boundary: opened mask minus its erosion (same kernel).
    pub boundary: GrayImage,
    /// Canny edge map over the normalized, blurred gray.
    pub edges: GrayImage,
}

/// Result of segmentation: the cleaned binary mask, plus optional
/// diagnostic layers for overlay rendering. Diagnostics never feed back
/// into measurement.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Binary particle mask (255 = particle) in ROI-local coordinates.
    pub mask: GrayImage,
    /// Overlay layers, when requested.
    pub diagnostics: Option<DiagnosticLayers>,
}

/// Segment the grayscale ROI into a binary particle mask.
///
/// Polarity: grounds are darker than the basket, so pixels darker than
/// their local background become foreground.
pub fn segment(
    gray_roi: &GrayImage,
    region: &RegionMask,
    config: &SegmentConfig,
    collect_diagnostics: bool,
) -> Segmentation {
    // 1. Local contrast normalization.
    let normalized = match config.contrast {
        ContrastMode::Clahe { clip_limit, tiles } => clahe(gray_roi, clip_limit, tiles),
        ContrastMode::GlobalEqualize => imageproc::contrast::equalize_histogram(gray_roi),
    };

    // 2. Light denoising blur.
    let blurred = blur_f32(&normalized, config.denoise_sigma);

    // 3. Adaptive binarization against a Gaussian-weighted local mean.
    let background = imageproc::filter::gaussian_blur_f32(&blurred, config.background_sigma);
    let (w, h) = gray_roi.dimensions();
    let mut mask = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = blurred.get_pixel(x, y)[0];
            let bg = background.get_pixel(x, y)[0];
            let fg = v <= bg - config.threshold_offset;
            mask.put_pixel(x, y, Luma([if fg { 255 } else { 0 }]));
        }
    }

    // 4. Zero excluded pixels before any morphology can bridge them.
    region.apply(&mut mask);

    // 5. Opening removes sub-pixel speckle without merging neighbors.
    let opened = imageproc::morphology::open(&mask, Norm::L1, config.open_radius);

    let diagnostics = collect_diagnostics.then(|| {
        let eroded = imageproc::morphology::erode(&opened, Norm::L1, config.open_radius);
        let mut boundary = opened.clone();
        for (b, e) in boundary.iter_mut().zip(eroded.iter()) {
            *b = b.saturating_sub(*e);
        }
        let edges = imageproc::edges::canny(&to_u8(&blurred), 50.0, 150.0);
        DiagnosticLayers { boundary, edges }
    });

    tracing::debug!(
        foreground_px = opened.iter().filter(|&&v| v > 0).count(),
        roi_w = w,
        roi_h = h,
        "segmentation mask ready"
    );

    Segmentation {
        mask: opened,
        diagnostics,
    }
}

/// Blur a u8 gray image in f32 space, keeping fractional precision for
/// the threshold comparison.
fn blur_f32(gray: &GrayImage, sigma: f32) -> ImageBuffer<Luma<f32>, Vec<f32>> {
    let (w, h) = gray.dimensions();
    let mut f = ImageBuffer::<Luma<f32>, Vec<f32>>::new(w, h);
    for (src, dst) in gray.iter().zip(f.iter_mut()) {
        *dst = *src as f32;
    }
    if sigma <= 0.0 {
        return f;
    }
    imageproc::filter::gaussian_blur_f32(&f, sigma)
}

fn to_u8(f: &ImageBuffer<Luma<f32>, Vec<f32>>) -> GrayImage {
    let (w, h) = f.dimensions();
    let mut out = GrayImage::new(w, h);
    for (src, dst) in f.iter().zip(out.iter_mut()) {
        *dst = src.round().clamp(0.0, 255.0) as u8;
    }
    out
}

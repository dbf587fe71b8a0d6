//! Automatic basket-rim detection.
//!
//! Downscale → blur → gradient-voting circular Hough → edge-alignment
//! scoring. The radius window assumes the basket fills most of the frame
//! but leaves margin; when several circles are plausible the scorer
//! prefers large, centered candidates that track actual image edges over
//! the first raw Hough hit.

mod hough;

use image::imageops::FilterType;
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::geometry::Circle;
use hough::GradientField;

/// Rim search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RimConfig {
    /// Longest image side is downscaled to at most this before the search.
    pub max_side: u32,
    /// Pre-search Gaussian blur sigma (suppresses grounds texture).
    pub blur_sigma: f32,
    /// Gradient magnitude vote threshold (fraction of max magnitude).
    pub grad_threshold: f32,
    /// Radius window as fractions of min(width, height).
    pub min_radius_frac: f64,
    /// Upper radius bound fraction.
    pub max_radius_frac: f64,
    /// Step between voted radii (pixels, downscaled frame).
    pub radius_step: f32,
    /// Minimum separation between candidate centers (pixels).
    pub min_center_dist: f32,
    /// Edge pixels required around the modal radius for a candidate.
    pub min_radius_votes: usize,
    /// Candidate centers examined per image.
    pub max_candidates: usize,
    /// Circumference sample count for edge-alignment scoring.
    pub score_samples: usize,
}

impl Default for RimConfig {
    fn default() -> Self {
        Self {
            max_side: 900,
            blur_sigma: 2.0,
            grad_threshold: 0.05,
            min_radius_frac: 0.25,
            max_radius_frac: 0.49,
            radius_step: 1.0,
            min_center_dist: 50.0,
            min_radius_votes: 30,
            max_candidates: 8,
            score_samples: 180,
        }
    }
}

/// Detect the basket rim in a grayscale photo.
///
/// Returns `None` when no plausible circle is found; the caller falls
/// back to manual calibration. The returned circle is in original image
/// coordinates regardless of internal downscaling.
pub fn detect_rim(gray: &GrayImage, config: &RimConfig) -> Option<Circle> {
    let (w, h) = gray.dimensions();
    if w < 16 || h < 16 {
        return None;
    }

    // Bound the Hough transform cost on large photos; remember the
    // inverse scale to map any hit back.
    let max_dim = w.max(h);
    let (work, inv_scale) = if max_dim > config.max_side {
        let scale = config.max_side as f64 / max_dim as f64;
        let sw = ((w as f64 * scale) as u32).max(1);
        let sh = ((h as f64 * scale) as u32).max(1);
        let small = image::imageops::resize(gray, sw, sh, FilterType::Triangle);
        (small, max_dim as f64 / config.max_side as f64)
    } else {
        (gray.clone(), 1.0)
    };

    let blurred = imageproc::filter::gaussian_blur_f32(&work, config.blur_sigma);
    let (ww, wh) = blurred.dimensions();
    let min_dim = ww.min(wh) as f64;
    let r_min = (min_dim * config.min_radius_frac).floor() as f32;
    let r_max = (min_dim * config.max_radius_frac).floor() as f32;

    let candidates = hough::find_candidates(&blurred, r_min, r_max, config);
    if candidates.is_empty() {
        tracing::debug!("rim search: no circle candidates");
        return None;
    }

    // Re-derive the gradient field once for scoring.
    let (field, _, _) = GradientField::compute(&blurred, config.grad_threshold)?;
    let center_x = ww as f32 / 2.0;
    let center_y = wh as f32 / 2.0;

    let mut best: Option<(f32, &hough::CircleCandidate)> = None;
    for cand in &candidates {
        let edge = mean_circumference_magnitude(&field, cand, config.score_samples);
        let center_dist = (cand.cx - center_x).hypot(cand.cy - center_y);
        let score = edge - center_dist + cand.r;
        tracing::debug!(
            cx = cand.cx,
            cy = cand.cy,
            r = cand.r,
            support = cand.support,
            edge,
            score,
            "rim candidate"
        );
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, cand));
        }
    }

    let (_, cand) = best?;
    Some(Circle {
        cx: cand.cx as f64 * inv_scale,
        cy: cand.cy as f64 * inv_scale,
        r: cand.r as f64 * inv_scale,
    })
}

/// Mean gradient magnitude sampled around a candidate's circumference.
fn mean_circumference_magnitude(
    field: &GradientField,
    cand: &hough::CircleCandidate,
    samples: usize,
) -> f32 {
    if samples == 0 {
        return 0.0;
    }
    let mut sum = 0.0f32;
    for i in 0..samples {
        let theta = i as f32 / samples as f32 * std::f32::consts::TAU;
        let x = cand.cx + cand.r * theta.cos();
        let y = cand.cy + cand.r * theta.sin();
        sum += field.sample(x, y);
    }
    sum / samples as f32
}

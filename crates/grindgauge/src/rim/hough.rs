//! Gradient-voting circular Hough search.
//!
//! Strong-gradient pixels vote along their gradient direction at every
//! radius in the search window; circle centers accumulate votes because
//! rim-boundary gradients converge radially. Peaks in the smoothed
//! accumulator become candidate centers, and each candidate's radius is
//! recovered from the modal edge-pixel distance.

use image::{GrayImage, ImageBuffer, Luma};

use super::RimConfig;

/// A candidate circle in downscaled-image coordinates.
#[derive(Debug, Clone, Copy)]
pub(super) struct CircleCandidate {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
    /// Edge pixels supporting the recovered radius.
    pub support: usize,
}

/// Per-pixel gradient magnitudes with the edge set above threshold.
pub(super) struct GradientField {
    pub mag: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// Indices of pixels whose magnitude clears the vote threshold.
    pub edge_px: Vec<usize>,
}

impl GradientField {
    /// Scharr gradient magnitudes; `threshold_frac` of the maximum
    /// magnitude gates which pixels may vote.
    pub(super) fn compute(gray: &GrayImage, threshold_frac: f32) -> Option<(Self, Vec<f32>, Vec<f32>)> {
        let (w, h) = gray.dimensions();
        if w < 8 || h < 8 {
            return None;
        }
        let gx = imageproc::gradients::horizontal_scharr(gray);
        let gy = imageproc::gradients::vertical_scharr(gray);
        let gx: Vec<f32> = gx.iter().map(|&v| v as f32).collect();
        let gy: Vec<f32> = gy.iter().map(|&v| v as f32).collect();

        let mut mag = vec![0.0f32; gx.len()];
        let mut max_mag = 0.0f32;
        for (m, (a, b)) in mag.iter_mut().zip(gx.iter().zip(gy.iter())) {
            *m = a.hypot(*b);
            if *m > max_mag {
                max_mag = *m;
            }
        }
        if max_mag < 1e-6 {
            return None;
        }
        let threshold = threshold_frac * max_mag;
        let edge_px = mag
            .iter()
            .enumerate()
            .filter(|(_, &m)| m >= threshold)
            .map(|(i, _)| i)
            .collect();
        Some((
            Self {
                mag,
                width: w as usize,
                height: h as usize,
                edge_px,
            },
            gx,
            gy,
        ))
    }

    /// Bilinearly sampled gradient magnitude; 0 outside the image.
    pub(super) fn sample(&self, x: f32, y: f32) -> f32 {
        if x < 0.0 || y < 0.0 || x >= (self.width - 1) as f32 || y >= (self.height - 1) as f32 {
            return 0.0;
        }
        let x0 = x as usize;
        let y0 = y as usize;
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;
        let base = y0 * self.width + x0;
        self.mag[base] * (1.0 - fx) * (1.0 - fy)
            + self.mag[base + 1] * fx * (1.0 - fy)
            + self.mag[base + self.width] * (1.0 - fx) * fy
            + self.mag[base + self.width + 1] * fx * fy
    }
}

/// Run the center-voting accumulator and recover candidate circles.
pub(super) fn find_candidates(
    gray: &GrayImage,
    r_min: f32,
    r_max: f32,
    config: &RimConfig,
) -> Vec<CircleCandidate> {
    let Some((field, gx, gy)) = GradientField::compute(gray, config.grad_threshold) else {
        return Vec::new();
    };
    if r_max <= r_min {
        return Vec::new();
    }

    let w = field.width;
    let h = field.height;
    let mut accum = vec![0.0f32; w * h];
    let x_limit = (w - 1) as f32;
    let y_limit = (h - 1) as f32;

    for &idx in &field.edge_px {
        let m = field.mag[idx];
        let inv = 1.0 / m;
        let dx = gx[idx] * inv;
        let dy = gy[idx] * inv;
        let xf = (idx % w) as f32;
        let yf = (idx / w) as f32;

        // Vote along both gradient senses; the rim may be lighter or
        // darker than its surroundings.
        let mut r = r_min;
        while r <= r_max {
            for sign in [1.0f32, -1.0] {
                let vx = xf + sign * dx * r;
                let vy = yf + sign * dy * r;
                if vx >= 0.0 && vx < x_limit && vy >= 0.0 && vy < y_limit {
                    bilinear_add(&mut accum, w, vx, vy, m);
                }
            }
            r += config.radius_step;
        }
    }

    // Smooth before peak extraction to merge split votes.
    let accum_img = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w as u32, h as u32, accum)
        .expect("accumulator dimensions match");
    let smoothed = imageproc::filter::gaussian_blur_f32(&accum_img, 2.0);
    let smoothed = smoothed.as_raw();

    let centers = accumulator_peaks(smoothed, w, h, config);

    centers
        .into_iter()
        .filter_map(|(cx, cy)| {
            let (r, support) = modal_radius(&field, cx, cy, r_min, r_max)?;
            (support >= config.min_radius_votes).then_some(CircleCandidate {
                cx,
                cy,
                r,
                support,
            })
        })
        .collect()
}

/// Non-maximum suppression over the smoothed accumulator.
fn accumulator_peaks(accum: &[f32], w: usize, h: usize, config: &RimConfig) -> Vec<(f32, f32)> {
    let max_val = accum.iter().cloned().fold(0.0f32, f32::max);
    if max_val < 1e-6 {
        return Vec::new();
    }
    let threshold = 0.25 * max_val;
    let sep = config.min_center_dist.max(1.0);
    let sep_sq = sep * sep;

    let mut peaks: Vec<(f32, f32, f32)> = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let v = accum[idx];
            if v < threshold {
                continue;
            }
            // 8-neighborhood local maximum.
            let is_max = [
                idx - w - 1,
                idx - w,
                idx - w + 1,
                idx - 1,
                idx + 1,
                idx + w - 1,
                idx + w,
                idx + w + 1,
            ]
            .iter()
            .all(|&n| accum[n] <= v);
            if is_max {
                peaks.push((x as f32, y as f32, v));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    // Greedy minimum-separation pass, strongest first.
    let mut kept: Vec<(f32, f32)> = Vec::new();
    for (x, y, _) in peaks {
        let far_enough = kept
            .iter()
            .all(|&(kx, ky)| (kx - x).powi(2) + (ky - y).powi(2) >= sep_sq);
        if far_enough {
            kept.push((x, y));
            if kept.len() >= config.max_candidates {
                break;
            }
        }
    }
    kept
}

/// Modal edge-pixel distance from a candidate center, with its support
/// count (votes in the modal bin and its two neighbors).
fn modal_radius(
    field: &GradientField,
    cx: f32,
    cy: f32,
    r_min: f32,
    r_max: f32,
) -> Option<(f32, usize)> {
    let bins = (r_max - r_min).ceil() as usize + 1;
    let mut hist = vec![0usize; bins];
    for &idx in &field.edge_px {
        let x = (idx % field.width) as f32;
        let y = (idx / field.width) as f32;
        let d = (x - cx).hypot(y - cy);
        if d >= r_min && d <= r_max {
            hist[(d - r_min) as usize] += 1;
        }
    }
    let best = hist
        .iter()
        .enumerate()
        .max_by_key(|(_, &count)| count)
        .map(|(i, _)| i)?;
    let support = hist[best.saturating_sub(1)]
        + hist[best]
        + hist.get(best + 1).copied().unwrap_or(0);
    if support == 0 {
        return None;
    }
    Some((r_min + best as f32 + 0.5, support))
}

#[inline]
fn bilinear_add(accum: &mut [f32], stride: usize, x: f32, y: f32, weight: f32) {
    let x0 = x as usize;
    let y0 = y as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let base = y0 * stride + x0;
    accum[base] += weight * (1.0 - fx) * (1.0 - fy);
    accum[base + 1] += weight * fx * (1.0 - fy);
    accum[base + stride] += weight * (1.0 - fx) * fy;
    accum[base + stride + 1] += weight * fx * fy;
}

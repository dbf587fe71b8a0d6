//! Contrast-limited adaptive histogram equalization.
//!
//! Tile-local histograms are clipped, the excess redistributed, and the
//! per-tile equalization LUTs blended bilinearly per pixel. The clip limit
//! keeps near-uniform regions (out-of-focus basket wall) from exploding
//! into noise the way plain per-tile equalization would.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Apply CLAHE over a `tiles x tiles` grid.
///
/// `clip_limit` is the usual multiple of the mean histogram bin height
/// (2.0 matches the OpenCV default used by the measurement pipeline).
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let tiles = tiles.max(1);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    // A grid coarser than the image collapses to per-pixel tiles otherwise.
    let tiles_x = tiles.min(w);
    let tiles_y = tiles.min(h);
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    // One equalization LUT per tile.
    let mut luts = vec![[0u8; BINS]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; BINS];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let area = ((x1 - x0) * (y1 - y0)) as u32;
            clip_histogram(&mut hist, clip_limit, area);

            let lut = &mut luts[(ty * tiles_x + tx) as usize];
            let scale = 255.0 / area as f32;
            let mut cdf = 0u32;
            for (v, bin) in hist.iter().enumerate() {
                cdf += bin;
                lut[v] = (cdf as f32 * scale).round().min(255.0) as u8;
            }
        }
    }

    // Blend the four surrounding tile LUTs per pixel.
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let ty0 = fy.floor().max(0.0) as u32;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wy = (fy - fy.floor()).clamp(0.0, 1.0);
        for x in 0..w {
            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let tx0 = fx.floor().max(0.0) as u32;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let wx = (fx - fx.floor()).clamp(0.0, 1.0);

            let v = gray.get_pixel(x, y)[0] as usize;
            let v00 = luts[(ty0 * tiles_x + tx0) as usize][v] as f32;
            let v01 = luts[(ty0 * tiles_x + tx1) as usize][v] as f32;
            let v10 = luts[(ty1 * tiles_x + tx0) as usize][v] as f32;
            let v11 = luts[(ty1 * tiles_x + tx1) as usize][v] as f32;
            let top = v00 * (1.0 - wx) + v01 * wx;
            let bottom = v10 * (1.0 - wx) + v11 * wx;
            let blended = top * (1.0 - wy) + bottom * wy;
            out.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Clip bins at `clip_limit` times the mean bin height and spread the
/// excess uniformly across all bins.
fn clip_histogram(hist: &mut [u32; BINS], clip_limit: f32, area: u32) {
    let limit = ((clip_limit * area as f32 / BINS as f32).max(1.0)) as u32;
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let per_bin = excess / BINS as u32;
    let mut remainder = (excess % BINS as u32) as usize;
    for bin in hist.iter_mut() {
        *bin += per_bin;
        if remainder > 0 {
            *bin += 1;
            remainder -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_preserves_dimensions() {
        let img = GrayImage::from_pixel(37, 23, Luma([120]));
        let out = clahe(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn flat_image_stays_flat() {
        // A constant image has a single occupied bin; clipping and
        // redistribution must not invent structure.
        let img = GrayImage::from_pixel(64, 64, Luma([90]));
        let out = clahe(&img, 2.0, 8);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn low_contrast_gradient_is_stretched() {
        // Values in [100, 131]; equalization should widen that range.
        let mut img = GrayImage::new(64, 64);
        for y in 0..64 {
            for x in 0..64 {
                img.put_pixel(x, y, Luma([100 + (x / 2) as u8]));
            }
        }
        let out = clahe(&img, 4.0, 4);
        let min = out.pixels().map(|p| p[0]).min().unwrap();
        let max = out.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 31, "contrast not stretched: {}..{}", min, max);
    }

    #[test]
    fn tiny_image_does_not_panic() {
        let img = GrayImage::from_pixel(3, 2, Luma([10]));
        let out = clahe(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }
}

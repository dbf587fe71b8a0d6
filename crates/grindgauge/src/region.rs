//! Region-of-interest and exclusion-zone handling.
//!
//! The analysis region is an optional ROI rectangle (absent = whole image)
//! with zero or more exclusion rectangles. Exclusions are resolved into
//! ROI-local pixel rectangles once, up front; segmentation zeroes them on
//! the binary mask *before* morphological cleanup so cleanup cannot bridge
//! across an excluded region, and contour extraction drops any component
//! whose centroid falls inside one.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in image-pixel coordinates, as supplied by
/// the host (free-hand drags arrive with fractional coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (pixels).
    pub x: f64,
    /// Top edge (pixels).
    pub y: f64,
    /// Width (pixels).
    pub w: f64,
    /// Height (pixels).
    pub h: f64,
}

impl Rect {
    /// Construct a rectangle.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// The resolved analysis region: integer ROI clamped to image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    /// Left edge in the source image (pixels).
    pub x: u32,
    /// Top edge in the source image (pixels).
    pub y: u32,
    /// Width (pixels).
    pub w: u32,
    /// Height (pixels).
    pub h: u32,
}

/// A resolved exclusion rectangle in ROI-local integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocalRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

/// Per-analysis inclusion mask: ROI plus clipped exclusion zones.
#[derive(Debug, Clone)]
pub struct RegionMask {
    roi: Roi,
    exclusions: Vec<LocalRect>,
}

impl RegionMask {
    /// Resolve a ROI and exclusion set against an image of the given size.
    ///
    /// The ROI origin is clamped into the image and its size clamped so it
    /// cannot exceed the image bounds minus the origin. Each exclusion is
    /// translated to ROI-local coordinates and clipped to the ROI; one
    /// wholly outside contributes nothing.
    pub fn build(image_w: u32, image_h: u32, roi: Option<&Rect>, exclusions: &[Rect]) -> Self {
        let roi = match roi {
            Some(r) => {
                let x = (r.x.max(0.0).floor() as u32).min(image_w.saturating_sub(1));
                let y = (r.y.max(0.0).floor() as u32).min(image_h.saturating_sub(1));
                let w = (r.w.max(0.0).floor() as u32).min(image_w - x).max(1);
                let h = (r.h.max(0.0).floor() as u32).min(image_h - y).max(1);
                Roi { x, y, w, h }
            }
            None => Roi {
                x: 0,
                y: 0,
                w: image_w,
                h: image_h,
            },
        };

        let exclusions = exclusions
            .iter()
            .filter_map(|r| clip_to_roi(r, &roi))
            .collect();

        Self { roi, exclusions }
    }

    /// The resolved ROI in source-image coordinates.
    pub fn roi(&self) -> Roi {
        self.roi
    }

    /// Zero excluded pixels on a ROI-local binary mask.
    pub fn apply(&self, mask: &mut GrayImage) {
        debug_assert_eq!(mask.dimensions(), (self.roi.w, self.roi.h));
        for z in &self.exclusions {
            for y in z.y..(z.y + z.h).min(mask.height()) {
                for x in z.x..(z.x + z.w).min(mask.width()) {
                    mask.put_pixel(x, y, image::Luma([0]));
                }
            }
        }
    }

    /// Whether a ROI-local point (e.g. a component centroid) lies inside
    /// any exclusion zone. Bounds are inclusive, matching the pixel span.
    pub fn excludes_point(&self, x: f64, y: f64) -> bool {
        self.exclusions.iter().any(|z| {
            x >= z.x as f64 && x <= (z.x + z.w) as f64 && y >= z.y as f64 && y <= (z.y + z.h) as f64
        })
    }

    /// Number of exclusion zones that survived clipping.
    pub fn exclusion_count(&self) -> usize {
        self.exclusions.len()
    }
}

/// Intersect an image-space rectangle with the ROI, in ROI-local coords.
fn clip_to_roi(r: &Rect, roi: &Roi) -> Option<LocalRect> {
    let x0 = r.x.floor().max(roi.x as f64);
    let y0 = r.y.floor().max(roi.y as f64);
    let x1 = (r.x + r.w).floor().min((roi.x + roi.w) as f64);
    let y1 = (r.y + r.h).floor().min((roi.y + roi.h) as f64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(LocalRect {
        x: (x0 - roi.x as f64) as u32,
        y: (y0 - roi.y as f64) as u32,
        w: (x1 - x0) as u32,
        h: (y1 - y0) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_ones(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, image::Luma([255]))
    }

    fn count_foreground(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] > 0).count()
    }

    #[test]
    fn absent_roi_covers_whole_image() {
        let rm = RegionMask::build(100, 80, None, &[]);
        assert_eq!(
            rm.roi(),
            Roi {
                x: 0,
                y: 0,
                w: 100,
                h: 80
            }
        );
    }

    #[test]
    fn roi_is_clamped_to_image_bounds() {
        let rm = RegionMask::build(100, 80, Some(&Rect::new(60.0, 50.0, 500.0, 500.0)), &[]);
        assert_eq!(
            rm.roi(),
            Roi {
                x: 60,
                y: 50,
                w: 40,
                h: 30
            }
        );
    }

    #[test]
    fn negative_roi_origin_is_clamped() {
        let rm = RegionMask::build(100, 80, Some(&Rect::new(-10.0, -5.0, 50.0, 40.0)), &[]);
        assert_eq!(
            rm.roi(),
            Roi {
                x: 0,
                y: 0,
                w: 50,
                h: 40
            }
        );
    }

    #[test]
    fn exclusion_straddling_roi_clips_to_intersection() {
        // ROI x in [10, 60); exclusion x in [0, 20) overlaps 10 columns.
        let rm = RegionMask::build(
            100,
            100,
            Some(&Rect::new(10.0, 10.0, 50.0, 50.0)),
            &[Rect::new(0.0, 10.0, 20.0, 50.0)],
        );
        let mut mask = mask_ones(50, 50);
        rm.apply(&mut mask);
        assert_eq!(count_foreground(&mask), 50 * 50 - 10 * 50);
        // Local x=5 is inside the clipped zone, x=15 is not.
        assert!(rm.excludes_point(5.0, 25.0));
        assert!(!rm.excludes_point(15.0, 25.0));
    }

    #[test]
    fn exclusion_wholly_outside_roi_has_no_effect() {
        let rm = RegionMask::build(
            200,
            200,
            Some(&Rect::new(10.0, 10.0, 50.0, 50.0)),
            &[Rect::new(100.0, 100.0, 30.0, 30.0)],
        );
        assert_eq!(rm.exclusion_count(), 0);
        let mut mask = mask_ones(50, 50);
        rm.apply(&mut mask);
        assert_eq!(count_foreground(&mask), 50 * 50);
    }

    #[test]
    fn excluded_pixels_are_zeroed_in_local_coords() {
        let rm = RegionMask::build(
            100,
            100,
            Some(&Rect::new(20.0, 20.0, 40.0, 40.0)),
            &[Rect::new(30.0, 30.0, 10.0, 10.0)],
        );
        let mut mask = mask_ones(40, 40);
        rm.apply(&mut mask);
        // Exclusion maps to local [10, 20) x [10, 20).
        assert_eq!(mask.get_pixel(10, 10)[0], 0);
        assert_eq!(mask.get_pixel(19, 19)[0], 0);
        assert_eq!(mask.get_pixel(20, 20)[0], 255);
        assert_eq!(count_foreground(&mask), 40 * 40 - 100);
    }
}

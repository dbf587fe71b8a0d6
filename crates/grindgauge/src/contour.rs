//! External contour extraction with geometric descriptors.
//!
//! Components are traced as external boundaries only — internal holes are
//! not separate particles. Each component carries the descriptors the
//! statistics stages need (area, perimeter, centroid, solidity,
//! circularity) plus an approximated polygon for audit overlays.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point as IPoint;
use serde::{Deserialize, Serialize};

/// Components below this pixel area are sensor/segmentation noise.
pub const MIN_COMPONENT_AREA_PX: f64 = 3.0;
/// Smallest physically plausible particle diameter (µm).
pub const MIN_DIAMETER_UM: f64 = 10.0;
/// Largest physically plausible particle diameter (µm).
pub const MAX_DIAMETER_UM: f64 = 3000.0;

/// Douglas-Peucker tolerance for the audit polygon (pixels).
const POLY_EPSILON_PX: f64 = 0.8;

/// One external boundary component, in ROI-local pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComponent {
    /// Centroid [x, y] from area moments.
    pub centroid: [f64; 2],
    /// Enclosed polygon area (pixels squared).
    pub area_px: f64,
    /// Closed boundary length (pixels).
    pub perimeter_px: f64,
    /// Area over convex-hull area, in [0, 1]; captures concavity.
    pub solidity: f64,
    /// Isoperimetric ratio `4*pi*area / perimeter^2`; 1 for a circle.
    pub circularity: f64,
    /// Approximated boundary polygon (audit overlays only).
    pub polygon: Vec<[f64; 2]>,
}

impl RawComponent {
    /// Diameter of the circle with the same area, in pixels.
    ///
    /// Purely area-based, so an irregular particle maps to its
    /// area-equivalent circle rather than a bounding construct.
    pub fn equivalent_diameter_px(&self) -> f64 {
        2.0 * (self.area_px / std::f64::consts::PI).sqrt()
    }
}

/// Extract external components from a binary mask (255 = foreground).
///
/// Components with area below [`MIN_COMPONENT_AREA_PX`] are dropped here;
/// the physical-diameter gate needs a scale and is applied by the caller.
pub fn extract_components(mask: &GrayImage) -> Vec<RawComponent> {
    let contours: Vec<Contour<i32>> = find_contours(mask);
    let n_total = contours.len();
    let components: Vec<RawComponent> = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .filter_map(component_from_boundary)
        .collect();
    tracing::debug!(
        outer = components.len(),
        traced = n_total,
        "contour extraction"
    );
    components
}

fn component_from_boundary(contour: &Contour<i32>) -> Option<RawComponent> {
    let pts = &contour.points;
    if pts.is_empty() {
        return None;
    }

    let area_px = polygon_area(pts);
    if area_px < MIN_COMPONENT_AREA_PX {
        return None;
    }

    let perimeter_px = closed_perimeter(pts);
    let centroid = polygon_centroid(pts);

    let hull = imageproc::geometry::convex_hull(pts.as_slice());
    let hull_area = polygon_area(&hull);
    let solidity = if hull_area > 0.0 {
        area_px / hull_area
    } else {
        0.0
    };
    let circularity = if perimeter_px > 0.0 {
        4.0 * std::f64::consts::PI * area_px / (perimeter_px * perimeter_px)
    } else {
        0.0
    };

    let polygon = imageproc::geometry::approximate_polygon_dp(pts, POLY_EPSILON_PX, true)
        .iter()
        .map(|p| [p.x as f64, p.y as f64])
        .collect();

    Some(RawComponent {
        centroid,
        area_px,
        perimeter_px,
        solidity,
        circularity,
        polygon,
    })
}

/// Shoelace area of a closed polygon (boundary pixel chain).
fn polygon_area(pts: &[IPoint<i32>]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (a, b) in closed_edges(pts) {
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// Length of the closed boundary chain.
fn closed_perimeter(pts: &[IPoint<i32>]) -> f64 {
    if pts.len() < 2 {
        return 0.0;
    }
    closed_edges(pts)
        .map(|(a, b)| {
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            dx.hypot(dy)
        })
        .sum()
}

/// Centroid from polygon area moments; falls back to the boundary mean
/// when the signed area degenerates (near-linear components).
fn polygon_centroid(pts: &[IPoint<i32>]) -> [f64; 2] {
    let mut twice_area = 0.0f64;
    let mut cx = 0.0f64;
    let mut cy = 0.0f64;
    for (a, b) in closed_edges(pts) {
        let cross = a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        twice_area += cross;
        cx += (a.x + b.x) as f64 * cross;
        cy += (a.y + b.y) as f64 * cross;
    }
    if twice_area.abs() < 1e-9 {
        let n = pts.len() as f64;
        let sx: f64 = pts.iter().map(|p| p.x as f64).sum();
        let sy: f64 = pts.iter().map(|p| p.y as f64).sum();
        return [sx / n, sy / n];
    }
    [cx / (3.0 * twice_area), cy / (3.0 * twice_area)]
}

fn closed_edges(
    pts: &[IPoint<i32>],
) -> impl Iterator<Item = (IPoint<i32>, IPoint<i32>)> + '_ {
    let n = pts.len();
    (0..n).map(move |i| (pts[i], pts[(i + 1) % n]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_filled_disk_mask;
    use approx::assert_relative_eq;
    use image::Luma;

    fn draw_square_mask(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    #[test]
    fn square_descriptors_match_geometry() {
        let mask = draw_square_mask(40, 40, 10, 12, 10);
        let comps = extract_components(&mask);
        assert_eq!(comps.len(), 1);
        let c = &comps[0];
        // Boundary pixels span 9x9; shoelace area 81, perimeter 36.
        assert_relative_eq!(c.area_px, 81.0);
        assert_relative_eq!(c.perimeter_px, 36.0);
        assert_relative_eq!(c.centroid[0], 14.5, epsilon = 1e-9);
        assert_relative_eq!(c.centroid[1], 16.5, epsilon = 1e-9);
        // A square's isoperimetric ratio is pi/4.
        assert_relative_eq!(c.circularity, std::f64::consts::FRAC_PI_4, epsilon = 1e-9);
        assert!(c.solidity > 0.99);
    }

    #[test]
    fn disk_is_round_and_centered() {
        let mask = draw_filled_disk_mask(80, 80, 40.0, 40.0, 15.0);
        let comps = extract_components(&mask);
        assert_eq!(comps.len(), 1);
        let c = &comps[0];
        assert_relative_eq!(c.centroid[0], 40.0, epsilon = 0.5);
        assert_relative_eq!(c.centroid[1], 40.0, epsilon = 0.5);
        // Digitized circle: area within ~10% of the ideal.
        let ideal = std::f64::consts::PI * 15.0 * 15.0;
        assert!((c.area_px - ideal).abs() / ideal < 0.1);
        assert!(c.circularity > 0.8);
        assert!(c.solidity > 0.9);
        let d = c.equivalent_diameter_px();
        assert!((d - 30.0).abs() < 2.0, "equivalent diameter {}", d);
    }

    #[test]
    fn equivalent_diameter_is_area_based() {
        // A 2:1 rectangle and the disk of equal area report the same
        // equivalent diameter.
        let mask = draw_square_mask(60, 60, 5, 5, 12);
        let c = &extract_components(&mask)[0];
        let expected = 2.0 * (c.area_px / std::f64::consts::PI).sqrt();
        assert_relative_eq!(c.equivalent_diameter_px(), expected);
    }

    #[test]
    fn sub_threshold_specks_are_dropped() {
        let mut mask = GrayImage::new(30, 30);
        // 2x2 block: boundary encloses a single unit square.
        for (x, y) in [(5, 5), (6, 5), (5, 6), (6, 6)] {
            mask.put_pixel(x, y, Luma([255]));
        }
        assert!(extract_components(&mask).is_empty());
    }

    #[test]
    fn holes_are_not_separate_components() {
        // A ring: outer disk minus inner disk. Only the outer boundary
        // yields a component.
        let mut mask = draw_filled_disk_mask(60, 60, 30.0, 30.0, 15.0);
        for y in 0..60 {
            for x in 0..60u32 {
                let dx = x as f64 - 30.0;
                let dy = y as f64 - 30.0;
                if (dx * dx + dy * dy).sqrt() < 6.0 {
                    mask.put_pixel(x, y, Luma([0]));
                }
            }
        }
        let comps = extract_components(&mask);
        assert_eq!(comps.len(), 1);
        // Solidity reflects the full outer hull, not the hole.
        assert!(comps[0].solidity < 1.0);
    }

    #[test]
    fn separate_disks_stay_separate() {
        let mut mask = draw_filled_disk_mask(100, 100, 25.0, 25.0, 8.0);
        let other = draw_filled_disk_mask(100, 100, 70.0, 65.0, 10.0);
        for (a, b) in mask.iter_mut().zip(other.iter()) {
            *a = (*a).max(*b);
        }
        assert_eq!(extract_components(&mask).len(), 2);
    }
}

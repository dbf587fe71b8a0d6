//! Basic geometric primitives and the 3-point circumcircle fit.

use serde::{Deserialize, Serialize};

/// A point in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (pixels).
    pub x: f64,
    /// Y coordinate (pixels).
    pub y: f64,
}

impl Point {
    /// Construct a point from pixel coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A circle in image-pixel coordinates.
///
/// Used both for the calibration rim and for equivalent-diameter overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center x (pixels).
    pub cx: f64,
    /// Center y (pixels).
    pub cy: f64,
    /// Radius (pixels).
    pub r: f64,
}

/// Determinant magnitude below which three points count as collinear.
const COLLINEAR_EPS: f64 = 1e-6;

/// Fit the circle passing through three points.
///
/// Solves the algebraic circumcircle via the expanded determinant formula.
/// Returns `None` when the points are (numerically) collinear, so callers
/// can prompt for a fresh pick instead of handling a panic.
pub fn circle_from_3(p1: Point, p2: Point, p3: Point) -> Option<Circle> {
    let a = p1.x * (p2.y - p3.y) - p1.y * (p2.x - p3.x) + p2.x * p3.y - p3.x * p2.y;
    if a.abs() < COLLINEAR_EPS {
        return None;
    }
    let s1 = p1.x * p1.x + p1.y * p1.y;
    let s2 = p2.x * p2.x + p2.y * p2.y;
    let s3 = p3.x * p3.x + p3.y * p3.y;
    let cx = (s1 * (p3.y - p2.y) + s2 * (p1.y - p3.y) + s3 * (p2.y - p1.y)) / (2.0 * a);
    let cy = (s1 * (p2.x - p3.x) + s2 * (p3.x - p1.x) + s3 * (p1.x - p2.x)) / (2.0 * a);
    let r = (cx - p1.x).hypot(cy - p1.y);
    Some(Circle { cx, cy, r })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn circumcircle_is_equidistant_from_inputs() {
        let p1 = Point::new(1.0, 7.0);
        let p2 = Point::new(8.0, 6.0);
        let p3 = Point::new(7.0, -2.0);
        let c = circle_from_3(p1, p2, p3).expect("non-collinear");
        for p in [p1, p2, p3] {
            let d = (c.cx - p.x).hypot(c.cy - p.y);
            assert_relative_eq!(d, c.r, epsilon = 1e-9);
        }
    }

    #[test]
    fn known_circle_is_recovered() {
        // Three points on a circle centered at (10, -4) with radius 5.
        let c = circle_from_3(
            Point::new(15.0, -4.0),
            Point::new(10.0, 1.0),
            Point::new(5.0, -4.0),
        )
        .expect("non-collinear");
        assert_relative_eq!(c.cx, 10.0, epsilon = 1e-9);
        assert_relative_eq!(c.cy, -4.0, epsilon = 1e-9);
        assert_relative_eq!(c.r, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_points_yield_none() {
        let c = circle_from_3(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        );
        assert!(c.is_none());
    }

    #[test]
    fn nearly_collinear_points_yield_none() {
        let c = circle_from_3(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0 + 1e-9),
        );
        assert!(c.is_none());
    }
}

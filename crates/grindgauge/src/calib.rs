//! Pixel-to-micron calibration from the basket rim circle.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::geometry::Circle;

/// Common basket inner diameters (mm), largest first. Free entry is also
/// accepted anywhere a diameter is taken.
pub const BASKET_PRESETS_MM: [f64; 6] = [58.5, 58.0, 54.0, 53.0, 51.0, 49.0];

/// Calibration input: the rim circle in image pixels plus the known
/// physical inner diameter of the basket.
///
/// The circle may come from automatic detection, a 3-point fit, or an
/// interactive drag — by the time it reaches the pipeline it is just a
/// circle. Scale must be recomputed whenever either field changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Rim circle in image-pixel coordinates.
    pub circle: Circle,
    /// Basket inner diameter in millimetres.
    pub basket_mm: f64,
}

impl Calibration {
    /// Create a calibration from a rim circle and basket diameter.
    pub fn new(circle: Circle, basket_mm: f64) -> Self {
        Self { circle, basket_mm }
    }

    /// Microns per pixel: `basket_mm * 1000 / (2 * r)`.
    ///
    /// Rejects nonpositive radius or diameter; segmentation must not run
    /// on an invalid scale.
    pub fn scale(&self) -> Result<UnitScale, AnalysisError> {
        if self.circle.r <= 0.0 || self.basket_mm <= 0.0 {
            return Err(AnalysisError::InvalidCalibration {
                r: self.circle.r,
                basket_mm: self.basket_mm,
            });
        }
        Ok(UnitScale {
            um_per_px: (self.basket_mm * 1000.0) / (2.0 * self.circle.r),
        })
    }
}

/// Linear pixel → micron conversion factor; areas scale by its square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    /// Microns per pixel.
    pub um_per_px: f64,
}

impl UnitScale {
    /// Convert a linear pixel quantity (diameter, perimeter) to microns.
    pub fn linear_um(&self, px: f64) -> f64 {
        px * self.um_per_px
    }

    /// Convert a pixel area to square microns.
    pub fn area_um2(&self, px2: f64) -> f64 {
        px2 * self.um_per_px * self.um_per_px
    }
}

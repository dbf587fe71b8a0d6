//! grindgauge — espresso grind particle-size analysis from a portafilter
//! photo.
//!
//! The basket rim, whose physical diameter is known, anchors the
//! pixel-to-micron scale; everything downstream is measured in microns.
//! The pipeline stages are:
//!
//! 1. **Rim** – automatic basket-rim detection (downscale → blur →
//!    gradient-voting circular Hough → edge-alignment scoring), with
//!    3-point and manual circle entry as fallbacks.
//! 2. **Calibration** – microns per pixel from the rim circle and the
//!    basket's inner diameter.
//! 3. **Region** – ROI resolution and exclusion-zone clipping.
//! 4. **Segment** – CLAHE (or global equalization), denoise, adaptive
//!    threshold, exclusion zeroing, morphological opening.
//! 5. **Contour** – external boundary tracing with area, perimeter,
//!    centroid, solidity and circularity descriptors.
//! 6. **Stats** – micron conversion, hard physical gates, IQR outlier
//!    rejection, percentile/dispersion summary.
//! 7. **Score** – composite 0–100 uniformity index.
//!
//! # Public API
//! [`Analyzer`] is the primary entry point: construct once, call
//! [`Analyzer::detect_rim`] and [`Analyzer::analyze`] per photo.
//! [`AnalysisConfig`] exposes the tuning knobs.

mod calib;
mod contour;
mod error;
mod geometry;
mod pipeline;
mod region;
mod rim;
mod score;
mod segment;
mod stats;
#[cfg(test)]
mod test_utils;

pub use calib::{Calibration, UnitScale, BASKET_PRESETS_MM};
pub use contour::{
    RawComponent, MAX_DIAMETER_UM, MIN_COMPONENT_AREA_PX, MIN_DIAMETER_UM,
};
pub use error::AnalysisError;
pub use geometry::{circle_from_3, Circle, Point};
pub use pipeline::{AnalysisConfig, AnalysisResult, Analyzer, Overlays, Particle};
pub use region::{Rect, Roi};
pub use rim::{detect_rim, RimConfig};
pub use score::precision_score;
pub use segment::{ContrastMode, SegmentConfig};
pub use stats::{iqr_filter, percentile, DistributionStats};

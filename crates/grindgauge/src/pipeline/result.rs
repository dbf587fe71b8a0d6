//! Analysis result types.

use serde::{Deserialize, Serialize};

use crate::region::Roi;
use crate::stats::DistributionStats;

/// One detected particle, in source-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Centroid [x, y] (pixels).
    pub centroid: [f64; 2],
    /// Contour area (pixels squared).
    pub area_px: f64,
    /// Closed contour perimeter (pixels).
    pub perimeter_px: f64,
    /// Area-equivalent diameter (µm).
    pub diameter_um: f64,
    /// Area (µm squared).
    pub area_um2: f64,
    /// Perimeter (µm).
    pub perimeter_um: f64,
    /// Area over convex-hull area.
    pub solidity: f64,
    /// Isoperimetric ratio; 1 for a perfect circle.
    pub circularity: f64,
    /// Approximated boundary polygon, for audit overlays only.
    pub polygon: Vec<[f64; 2]>,
    /// Whether the diameter lies within the band spanned by the
    /// IQR-filtered population of this run.
    pub accepted: bool,
}

/// Complete output of one analysis run.
///
/// Recomputed in full on every invocation; nothing is carried between
/// runs. An empty particle list with `stats: None` is the valid
/// "no particles survived filtering" outcome, prompting ROI or exposure
/// adjustment rather than an error path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Microns per pixel used for every conversion in this run.
    pub scale_um_per_px: f64,
    /// Source image dimensions [width, height].
    pub image_size: [u32; 2],
    /// Resolved analysis region.
    pub roi: Roi,
    /// Every particle that passed the hard gates, accepted or not.
    pub particles: Vec<Particle>,
    /// IQR-filtered diameters (µm), ascending.
    pub filtered_diameters_um: Vec<f64>,
    /// Distribution summary; `None` when no particle survived filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DistributionStats>,
    /// Composite 0-100 uniformity index (heuristic).
    pub precision_score: u8,
}

impl AnalysisResult {
    /// Accepted particles only, in detection order.
    pub fn accepted(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.accepted)
    }

    /// True when nothing survived filtering.
    pub fn is_empty(&self) -> bool {
        self.filtered_diameters_um.is_empty()
    }
}

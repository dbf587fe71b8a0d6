//! Pipeline orchestration: one pure, idempotent analysis call.
//!
//! Stage order: calibration check → region resolution → segmentation →
//! contour extraction → unit conversion → IQR outlier rejection →
//! distribution statistics → uniformity score. Algorithmic primitives
//! live in `rim`, `segment`, `contour`, and `stats`; this layer owns
//! stage boundaries and data flow only.

mod result;

pub use result::{AnalysisResult, Particle};

use image::imageops;
use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::calib::Calibration;
use crate::contour::{self, RawComponent};
use crate::error::AnalysisError;
use crate::geometry::Circle;
use crate::region::{Rect, RegionMask};
use crate::rim::{detect_rim, RimConfig};
use crate::score::precision_score;
use crate::segment::{segment, SegmentConfig};
use crate::stats::{iqr_filter, DistributionStats};

/// Full pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Automatic rim detection parameters.
    pub rim: RimConfig,
    /// Segmentation parameters.
    pub segment: SegmentConfig,
}

/// Display-only layers from one analysis run, in ROI-local coordinates.
///
/// Consumed by overlay renderers; never by measurement.
#[derive(Debug, Clone)]
pub struct Overlays {
    /// ROI origin [x, y] in source-image pixels.
    pub origin: [u32; 2],
    /// Binary particle mask after cleanup.
    pub mask: GrayImage,
    /// Mask boundary (mask minus its erosion).
    pub boundary: GrayImage,
    /// Canny edge map of the normalized gray.
    pub edges: GrayImage,
}

/// Primary analysis interface. Create once, analyze many images.
///
/// The `Analyzer` value is also the processing capability handle: the
/// engine is statically linked, so an `Analyzer` that exists is ready by
/// construction. Hosts that load the core behind an async boundary gate
/// analysis actions on owning one rather than polling a readiness flag.
///
/// Each call owns its working buffers and returns a complete
/// [`AnalysisResult`]; nothing is shared across invocations, so hosts may
/// run analysis off the interaction thread and re-run it freely after a
/// ROI or calibration edit.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Mutable access for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut AnalysisConfig {
        &mut self.config
    }

    /// Automatic rim detection on a decoded photo.
    ///
    /// `None` means nothing plausible was found and the caller should fall
    /// back to manual (3-point or dragged) calibration.
    pub fn detect_rim(&self, image: &RgbaImage) -> Option<Circle> {
        let gray = imageops::grayscale(image);
        detect_rim(&gray, &self.config.rim)
    }

    /// Run the full analysis pipeline.
    ///
    /// Pure function of its inputs: identical image, calibration, ROI and
    /// exclusions produce a bit-identical result. `calibration: None`
    /// refuses to run — segmentation requires an established scale.
    pub fn analyze(
        &self,
        image: &RgbaImage,
        calibration: Option<&Calibration>,
        roi: Option<&Rect>,
        exclusions: &[Rect],
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(image, calibration, roi, exclusions, false)
            .map(|(result, _)| result)
    }

    /// Like [`Self::analyze`], additionally returning overlay layers for
    /// audit rendering.
    pub fn analyze_with_overlays(
        &self,
        image: &RgbaImage,
        calibration: Option<&Calibration>,
        roi: Option<&Rect>,
        exclusions: &[Rect],
    ) -> Result<(AnalysisResult, Overlays), AnalysisError> {
        let (result, overlays) = self.run(image, calibration, roi, exclusions, true)?;
        let overlays = overlays.expect("overlays collected when requested");
        Ok((result, overlays))
    }

    fn run(
        &self,
        image: &RgbaImage,
        calibration: Option<&Calibration>,
        roi: Option<&Rect>,
        exclusions: &[Rect],
        collect_overlays: bool,
    ) -> Result<(AnalysisResult, Option<Overlays>), AnalysisError> {
        let calibration = calibration.ok_or(AnalysisError::CalibrationMissing)?;
        let scale = calibration.scale()?;

        let (w, h) = image.dimensions();
        let region = RegionMask::build(w, h, roi, exclusions);
        let roi_rect = region.roi();

        let gray = imageops::grayscale(image);
        let gray_roi =
            imageops::crop_imm(&gray, roi_rect.x, roi_rect.y, roi_rect.w, roi_rect.h).to_image();

        let seg = segment(&gray_roi, &region, &self.config.segment, collect_overlays);
        let components = contour::extract_components(&seg.mask);
        let n_traced = components.len();

        // Hard gates: centroid exclusion, then physical plausibility.
        let mut kept: Vec<(RawComponent, f64)> = Vec::new();
        for comp in components {
            if region.excludes_point(comp.centroid[0], comp.centroid[1]) {
                continue;
            }
            let d_um = scale.linear_um(comp.equivalent_diameter_px());
            if !(contour::MIN_DIAMETER_UM..=contour::MAX_DIAMETER_UM).contains(&d_um) {
                continue;
            }
            kept.push((comp, d_um));
        }

        // Statistical rejection; the accepted band is the filtered set's
        // min/max rather than a fence re-test. Equivalent by construction
        // (every retained value already lies inside the fence) and kept
        // that way deliberately.
        let diameters: Vec<f64> = kept.iter().map(|(_, d)| *d).collect();
        let filtered = iqr_filter(&diameters);
        let band = match (filtered.first(), filtered.last()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi)),
            _ => None,
        };

        let ox = roi_rect.x as f64;
        let oy = roi_rect.y as f64;
        let particles: Vec<Particle> = kept
            .into_iter()
            .map(|(comp, d_um)| {
                let accepted = band.is_some_and(|(lo, hi)| d_um >= lo && d_um <= hi);
                Particle {
                    centroid: [comp.centroid[0] + ox, comp.centroid[1] + oy],
                    area_px: comp.area_px,
                    perimeter_px: comp.perimeter_px,
                    diameter_um: d_um,
                    area_um2: scale.area_um2(comp.area_px),
                    perimeter_um: scale.linear_um(comp.perimeter_px),
                    solidity: comp.solidity,
                    circularity: comp.circularity,
                    polygon: comp
                        .polygon
                        .iter()
                        .map(|[x, y]| [x + ox, y + oy])
                        .collect(),
                    accepted,
                }
            })
            .collect();

        let stats = DistributionStats::from_diameters(&filtered);
        let score = precision_score(stats.as_ref());

        tracing::info!(
            traced = n_traced,
            gated = particles.len(),
            filtered = filtered.len(),
            score,
            scale_um_per_px = scale.um_per_px,
            "analysis complete"
        );

        let overlays = seg.diagnostics.map(|layers| Overlays {
            origin: [roi_rect.x, roi_rect.y],
            mask: seg.mask.clone(),
            boundary: layers.boundary,
            edges: layers.edges,
        });

        let result = AnalysisResult {
            scale_um_per_px: scale.um_per_px,
            image_size: [w, h],
            roi: roi_rect,
            particles,
            filtered_diameters_um: filtered,
            stats,
            precision_score: score,
        };
        Ok((result, overlays))
    }
}

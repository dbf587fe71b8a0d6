//! Composite grind-uniformity score.
//!
//! A heuristic 0–100 index blending three normalized dispersion measures.
//! It is a comparative convenience number, not a calibration-grade
//! measurement.

use crate::stats::DistributionStats;

/// Weight of the GSD sub-score.
const W_GSD: f64 = 0.5;
/// Weight of the IQR/median sub-score.
const W_IQR: f64 = 0.3;
/// Weight of the span sub-score.
const W_SPAN: f64 = 0.2;

/// Score the uniformity of a filtered size distribution.
///
/// `round(100 * (0.5*s_gsd + 0.3*s_iqr + 0.2*s_span))` with each sub-score
/// clamped to [0, 1]:
/// - `s_gsd`: 1 at gsd = 1 (monodisperse), 0 at gsd >= 2;
/// - `s_iqr`: 0 once IQR/median reaches 0.8;
/// - `s_span`: 0 once span reaches 4.
///
/// An empty population (`None` stats) scores 0.
pub fn precision_score(stats: Option<&DistributionStats>) -> u8 {
    let Some(s) = stats else {
        return 0;
    };
    let s_gsd = (2.0 - s.gsd.min(2.0)).clamp(0.0, 1.0);
    let s_iqr = (1.0 - s.iqr_over_median / 0.8).clamp(0.0, 1.0);
    let s_span = (1.0 - (s.span.max(1.0) - 1.0) / 3.0).clamp(0.0, 1.0);
    let blended = W_GSD * s_gsd + W_IQR * s_iqr + W_SPAN * s_span;
    (100.0 * blended).round() as u8
}

//! Robust outlier rejection and distribution statistics for the filtered
//! diameter population.

use serde::{Deserialize, Serialize};

/// Linearly interpolated percentile, `p` in [0, 100].
///
/// Index is `(n - 1) * p / 100`, interpolating between the floor/ceil
/// neighbors. Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, p)
}

/// Percentile over an already ascending-sorted slice.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let i = (p / 100.0) * (n - 1) as f64;
    let lo = i.floor() as usize;
    let hi = i.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = i - lo as f64;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

/// IQR fence outlier rejection.
///
/// Fewer than 4 values are returned unchanged (too small a sample for
/// robust quartiles). Otherwise keeps values in
/// `[q1 - 1.5*IQR, q3 + 1.5*IQR]`. The output is sorted ascending.
pub fn iqr_filter(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() < 4 {
        return sorted;
    }
    let q1 = percentile_sorted(&sorted, 25.0);
    let q3 = percentile_sorted(&sorted, 75.0);
    let iqr = q3 - q1;
    let lo = q1 - 1.5 * iqr;
    let hi = q3 + 1.5 * iqr;
    sorted.retain(|&v| v >= lo && v <= hi);
    sorted
}

/// Distribution summary over the IQR-filtered diameter set (µm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Number of diameters summarized.
    pub count: usize,
    /// 10th percentile diameter (µm).
    pub d10: f64,
    /// Median diameter (µm).
    pub d50: f64,
    /// 90th percentile diameter (µm).
    pub d90: f64,
    /// d90 / d10; `f64::INFINITY` sentinel when d10 <= 0.
    pub span: f64,
    /// Arithmetic mean diameter (µm).
    pub mean: f64,
    /// Population standard deviation (divides by n).
    pub std_dev: f64,
    /// Coefficient of variation, std_dev / mean.
    pub cv: f64,
    /// Geometric standard deviation, `exp(stddev(ln d))`.
    /// 1.0 is perfectly monodisperse; grows with heavy-tailedness.
    pub gsd: f64,
    /// (q3 - q1) / d50.
    pub iqr_over_median: f64,
}

impl DistributionStats {
    /// Summarize a filtered diameter set. Returns `None` when empty, so an
    /// empty run stays distinguishable from a degenerate one.
    pub fn from_diameters(diameters: &[f64]) -> Option<Self> {
        if diameters.is_empty() {
            return None;
        }
        let mut sorted = diameters.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len() as f64;

        let d10 = percentile_sorted(&sorted, 10.0);
        let d50 = percentile_sorted(&sorted, 50.0);
        let d90 = percentile_sorted(&sorted, 90.0);
        let q1 = percentile_sorted(&sorted, 25.0);
        let q3 = percentile_sorted(&sorted, 75.0);

        let span = if d10 > 0.0 { d90 / d10 } else { f64::INFINITY };

        let mean = sorted.iter().sum::<f64>() / n;
        let var = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std_dev = var.sqrt();
        let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

        // Geometric dispersion over log diameters. Diameters reaching this
        // point passed the 10 µm hard gate, so the logs are finite.
        let log_mean = sorted.iter().map(|v| v.ln()).sum::<f64>() / n;
        let log_var = sorted
            .iter()
            .map(|v| {
                let d = v.ln() - log_mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let gsd = log_var.sqrt().exp();

        let iqr_over_median = if d50 > 0.0 { (q3 - q1) / d50 } else { 0.0 };

        Some(Self {
            count: sorted.len(),
            d10,
            d50,
            d90,
            span,
            mean,
            std_dev,
            cv,
            gsd,
            iqr_over_median,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentile_interpolates() {
        assert_relative_eq!(percentile(&[10.0, 20.0, 30.0, 40.0], 50.0), 25.0);
        assert_relative_eq!(percentile(&[10.0, 20.0, 30.0, 40.0], 0.0), 10.0);
        assert_relative_eq!(percentile(&[10.0, 20.0, 30.0, 40.0], 100.0), 40.0);
        assert_relative_eq!(percentile(&[40.0, 10.0, 30.0, 20.0], 25.0), 17.5);
    }

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn iqr_filter_passes_short_inputs_through() {
        assert!(iqr_filter(&[]).is_empty());
        assert_eq!(iqr_filter(&[5.0]), vec![5.0]);
        assert_eq!(iqr_filter(&[3.0, 1.0, 2.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn iqr_filter_drops_outlier() {
        // q1 = 2, q3 = 4.25... with interpolation; the fence comfortably
        // contains 1..=5 and rejects 100.
        let kept = iqr_filter(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        assert_eq!(kept, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn monodisperse_population_has_unit_dispersion() {
        let s = DistributionStats::from_diameters(&[10.0, 10.0, 10.0, 10.0]).unwrap();
        assert_relative_eq!(s.gsd, 1.0);
        assert_relative_eq!(s.cv, 0.0);
        assert_relative_eq!(s.span, 1.0);
        assert_relative_eq!(s.iqr_over_median, 0.0);
        assert_relative_eq!(s.mean, 10.0);
        assert_relative_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn std_dev_is_population_not_sample() {
        // Population std of [2, 4] is 1.0 (sample std would be sqrt(2)).
        let s = DistributionStats::from_diameters(&[2.0, 4.0]).unwrap();
        assert_relative_eq!(s.std_dev, 1.0);
    }

    #[test]
    fn empty_population_has_no_stats() {
        assert!(DistributionStats::from_diameters(&[]).is_none());
    }

    #[test]
    fn span_guards_against_zero_d10() {
        let s = DistributionStats::from_diameters(&[0.0, 0.0, 0.0, 50.0]).unwrap();
        assert!(s.span.is_infinite());
    }
}

//! Pipeline error type.
//!
//! Everything here is local and recoverable: a failed automatic rim search
//! and a degenerate 3-point fit are `None` returns on their respective
//! functions, and a run in which no particle survives filtering is a
//! successful, empty [`crate::AnalysisResult`]. Only preconditions the
//! caller must fix before analysis can run are surfaced as errors.

/// Errors returned by [`crate::Analyzer::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// No calibration circle has been established; segmentation is blocked
    /// until the caller supplies one (automatic, 3-point, or manual).
    CalibrationMissing,
    /// Calibration exists but cannot produce a positive scale.
    InvalidCalibration {
        /// Rim radius that was supplied (pixels).
        r: f64,
        /// Basket diameter that was supplied (mm).
        basket_mm: f64,
    },
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CalibrationMissing => {
                write!(f, "no calibration circle; detect or pick the rim first")
            }
            Self::InvalidCalibration { r, basket_mm } => write!(
                f,
                "invalid calibration: rim radius {} px, basket diameter {} mm (both must be > 0)",
                r, basket_mm
            ),
        }
    }
}

impl std::error::Error for AnalysisError {}

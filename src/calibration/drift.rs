//! Memory exclusion and piecewise-constant drift correction
//!
//! Ambient windows that start within `memory_skip_secs` of any reference run
//! end are dropped. Every surviving window is corrected with the calibration
//! point in force at its timestamp: the latest point at or before it, or the
//! first point for windows that precede all calibrations.

use crate::config::CalibrationConfig;
use crate::error::{PicarroError, Result};
use crate::models::{CalibrationPoint, CorrectedRecord, IsotopePair, WindowMean};
use crate::timestamp::Timestamp;
use tracing::{debug, info};

/// Index of the step-function segment containing `t`
///
/// `times` must be sorted ascending and non-empty. Segments are closed on the
/// left; queries before the first time clamp to 0, queries at or after the
/// last time clamp to the last index.
pub fn step_index(times: &[Timestamp], t: Timestamp) -> usize {
    times.partition_point(|time| *time <= t).saturating_sub(1)
}

/// Corrected records plus the count of windows dropped for memory effect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftOutcome {
    pub records: Vec<CorrectedRecord>,
    pub excluded: usize,
}

/// Drift lookup table for one evaluation year
#[derive(Debug, Clone)]
pub struct DriftCorrector {
    calibration: Vec<CalibrationPoint>,
    calibration_times: Vec<Timestamp>,
    exclusion_markers: Vec<Timestamp>,
    reference_true: IsotopePair,
    baseline_offset: IsotopePair,
    memory_skip_secs: i64,
}

impl DriftCorrector {
    /// Build the lookup table; an empty calibration set is fatal for `year`
    pub fn new(
        year: i32,
        mut calibration: Vec<CalibrationPoint>,
        mut exclusion_markers: Vec<Timestamp>,
        config: &CalibrationConfig,
    ) -> Result<Self> {
        if calibration.is_empty() {
            return Err(PicarroError::NoCalibrationPoints { year });
        }

        calibration.sort_by_key(|p| p.timestamp);
        exclusion_markers.sort();
        let calibration_times = calibration.iter().map(|p| p.timestamp).collect();

        Ok(Self {
            calibration,
            calibration_times,
            exclusion_markers,
            reference_true: config.reference_true,
            baseline_offset: config.baseline_offset,
            memory_skip_secs: config.memory_skip_secs,
        })
    }

    pub fn calibration(&self) -> &[CalibrationPoint] {
        &self.calibration
    }

    /// Whether `t` lies in `[end, end + skip)` for some reference run end
    pub fn is_memory_affected(&self, t: Timestamp) -> bool {
        // Markers are sorted, so the latest one at or before `t` has the furthest reach
        let idx = self.exclusion_markers.partition_point(|m| *m <= t);
        idx > 0 && t.seconds_since(self.exclusion_markers[idx - 1]) < self.memory_skip_secs
    }

    /// Calibration point in force at `t`
    pub fn calibration_for(&self, t: Timestamp) -> &CalibrationPoint {
        &self.calibration[step_index(&self.calibration_times, t)]
    }

    /// Measured minus certified reference value at `t`
    pub fn drift_offset(&self, t: Timestamp) -> IsotopePair {
        let point = self.calibration_for(t);
        IsotopePair::new(
            point.d18o - self.reference_true.d18o,
            point.d2h - self.reference_true.d2h,
        )
    }

    /// Drop memory-affected windows and correct the rest, preserving order
    pub fn correct(&self, windows: Vec<WindowMean>) -> DriftOutcome {
        let total = windows.len();
        let mut records = Vec::with_capacity(total);

        for window in windows {
            if self.is_memory_affected(window.timestamp) {
                debug!("Window at {} skipped: memory effect", window.timestamp);
                continue;
            }

            // Constant pre-offset, zero unless configured
            let d18o = window.d18o - self.baseline_offset.d18o;
            let d2h = window.d2h - self.baseline_offset.d2h;

            let drift = self.drift_offset(window.timestamp);
            records.push(CorrectedRecord::new(
                window.timestamp,
                d18o - drift.d18o,
                d2h - drift.d2h,
                window.water_ppm,
            ));
        }

        let excluded = total - records.len();
        info!(
            "Drift correction complete: {} -> {} windows ({} excluded for memory effect, {} calibration points)",
            total,
            records.len(),
            excluded,
            self.calibration.len()
        );

        DriftOutcome { records, excluded }
    }
}

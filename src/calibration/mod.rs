//! Calibration and correction pipeline.
//!
//! Takes already-parsed analyzer readings for one calendar year through the
//! correction stages:
//!
//! 1. reference runs are segmented and averaged into calibration points
//!    ([`reference`], using the injection correction from [`injection`]),
//! 2. ambient readings are humidity-corrected and block-averaged ([`window`]),
//! 3. memory-affected windows are dropped and the rest drift-corrected
//!    against the calibration points ([`drift`]).
//!
//! Every stage consumes its input and returns a new sequence; no state is
//! shared between stages or between years.

pub mod drift;
pub mod injection;
pub mod reference;
pub mod window;

#[cfg(test)]
pub mod tests;

use self::drift::DriftCorrector;
use self::injection::humidity_correct;
use self::reference::{average_reference_runs, segment_runs};
use self::window::average_windows;

use crate::config::CalibrationConfig;
use crate::error::{PicarroError, Result};
use crate::models::{CalibrationPoint, CorrectedRecord, Measurement, SkipSummary};
use tracing::info;

/// Corrected output of one evaluation year
#[derive(Debug, Clone, PartialEq)]
pub struct YearResult {
    pub year: i32,
    pub calibration: Vec<CalibrationPoint>,
    pub records: Vec<CorrectedRecord>,
    pub skips: SkipSummary,
}

/// Run all correction stages for `year`
///
/// Readings from other years are ignored. Fails with
/// [`PicarroError::NoCalibrationPoints`] before any ambient data is touched
/// when no reference run of the year qualifies.
pub fn calibrate_year(
    year: i32,
    standards: &[Measurement],
    ambient: &[Measurement],
    config: &CalibrationConfig,
) -> Result<YearResult> {
    config.validate()?;

    let year_standards: Vec<Measurement> = standards
        .iter()
        .filter(|m| m.timestamp.year() == year)
        .cloned()
        .collect();
    let runs = segment_runs(year_standards);
    let averaging = average_reference_runs(&runs, config);
    let mut skips = averaging.skips;

    info!(
        "Year {}: {} reference runs, {} calibration points",
        year,
        runs.len(),
        averaging.points.len()
    );

    let corrector = DriftCorrector::new(
        year,
        averaging.points,
        averaging.run_end_times,
        config,
    )?;

    let mut year_ambient: Vec<Measurement> = ambient
        .iter()
        .filter(|m| m.timestamp.year() == year)
        .cloned()
        .collect();
    if year_ambient.is_empty() {
        return Err(PicarroError::NoAmbientData { year });
    }
    year_ambient.sort_by_key(|m| m.timestamp);

    let corrected = humidity_correct(year_ambient);
    let windows = average_windows(&corrected, config.window_size);
    skips.trailing_measurements = windows.discarded_tail;
    info!(
        "Year {}: {} ambient injections -> {} windows",
        year,
        corrected.len(),
        windows.means.len()
    );

    let outcome = corrector.correct(windows.means);
    skips.memory_excluded_windows = outcome.excluded;

    Ok(YearResult {
        year,
        calibration: corrector.calibration().to_vec(),
        records: outcome.records,
        skips,
    })
}

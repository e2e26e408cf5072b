//! Core data structures for isotope calibration.
//!
//! Defines measurements, reference runs, calibration points, window means,
//! corrected output records, meteorological records, and the statistics
//! carried alongside them through the pipeline.

use crate::constants::D_EXCESS_SLOPE;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The two isotope ratios the analyzer reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Isotope {
    /// δ18O
    Oxygen18,
    /// δ2H
    Hydrogen2,
}

/// A value per isotope, used for offsets and certified reference values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IsotopePair {
    pub d18o: f64,
    pub d2h: f64,
}

impl IsotopePair {
    pub fn new(d18o: f64, d2h: f64) -> Self {
        Self { d18o, d2h }
    }
}

/// Deuterium excess `δ2H − 8·δ18O`
pub fn deuterium_excess(d18o: f64, d2h: f64) -> f64 {
    d2h - D_EXCESS_SLOPE * d18o
}

/// Run membership of a reference-material injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTag {
    /// Analysis identifier; changes whenever a new run starts
    pub analysis: String,
    /// Reference material identifier
    pub identifier: String,
    /// 1-based injection index within the run
    pub injection: u32,
    /// Set for the equilibration runs at the start of a session
    pub first_of_session: bool,
}

/// One analyzer reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: Timestamp,
    /// Port or channel label, e.g. `Ambient` or a reference-material port
    pub port: String,
    pub water_ppm: f64,
    pub d18o: f64,
    pub d2h: f64,
    /// Present for reference-material injections only
    pub run: Option<RunTag>,
}

impl Measurement {
    /// An ambient-air reading without run bookkeeping
    pub fn ambient(timestamp: Timestamp, water_ppm: f64, d18o: f64, d2h: f64) -> Self {
        Self {
            timestamp,
            port: "Ambient".to_string(),
            water_ppm,
            d18o,
            d2h,
            run: None,
        }
    }
}

/// A maximal contiguous sequence of injections sharing analysis id and port
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub analysis: String,
    pub port: String,
    pub identifier: String,
    pub first_of_session: bool,
    pub injections: Vec<Measurement>,
}

impl Run {
    /// Timestamp of the last injection; runs are never empty
    pub fn end_time(&self) -> Option<Timestamp> {
        self.injections.last().map(|m| m.timestamp)
    }

    pub fn len(&self) -> usize {
        self.injections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injections.is_empty()
    }
}

/// Averaged reference run used as a drift lookup entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Timestamp of the run's last injection
    pub timestamp: Timestamp,
    pub identifier: String,
    pub analysis: String,
    pub d18o: f64,
    pub d18o_sd: f64,
    pub d2h: f64,
    pub d2h_sd: f64,
}

/// Mean of one fixed-size block of ambient injections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowMean {
    /// Timestamp of the block's middle element
    pub timestamp: Timestamp,
    pub d18o: f64,
    pub d2h: f64,
    pub water_ppm: f64,
}

/// Final drift-corrected ambient record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectedRecord {
    pub timestamp: Timestamp,
    pub d18o: f64,
    pub d2h: f64,
    pub d_excess: f64,
    pub water_ppm: f64,
}

impl CorrectedRecord {
    pub fn new(timestamp: Timestamp, d18o: f64, d2h: f64, water_ppm: f64) -> Self {
        Self {
            timestamp,
            d18o,
            d2h,
            d_excess: deuterium_excess(d18o, d2h),
            water_ppm,
        }
    }
}

/// One row of the independently logged meteorological station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeteoRecord {
    pub timestamp: Timestamp,
    pub wind_velocity: f64,
    pub convective_temperature: f64,
    pub relative_humidity_1: f64,
    pub relative_humidity_2: f64,
    pub global_radiation: f64,
    pub air_pressure: f64,
    pub ventilated_temperature: f64,
    pub wind_direction: f64,
    pub precipitation: f64,
}

/// Corrected record paired with its nearest meteorological observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub record: CorrectedRecord,
    pub meteo: MeteoRecord,
}

/// Per-file parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Data rows encountered after the header
    pub total_records: usize,
    /// Rows turned into records
    pub parsed: usize,
    /// Rows with a malformed timestamp or non-numeric field
    pub parse_errors: usize,
    /// Reference rows whose H2O slope fell outside the accepted range
    pub slope_rejected: usize,
    /// First few error messages for debugging
    pub errors: Vec<String>,
}

impl ParseStats {
    const MAX_KEPT_ERRORS: usize = 20;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parse_error(&mut self, message: String) {
        self.parse_errors += 1;
        if self.errors.len() < Self::MAX_KEPT_ERRORS {
            self.errors.push(message);
        }
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.parsed as f64 / self.total_records as f64) * 100.0
        }
    }
}

/// Records parsed from one input file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile<T> {
    pub records: Vec<T>,
    pub stats: ParseStats,
}

/// Counts of every record, run, or window dropped on the way to the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipSummary {
    pub parse_errors: usize,
    pub slope_rejected: usize,
    pub outside_year: usize,
    pub first_of_session_runs: usize,
    pub incomplete_runs: usize,
    pub non_reference_runs: usize,
    pub trailing_measurements: usize,
    pub memory_excluded_windows: usize,
    pub meteo_unmatched: usize,
}

impl SkipSummary {
    pub fn merge(&mut self, other: &SkipSummary) {
        self.parse_errors += other.parse_errors;
        self.slope_rejected += other.slope_rejected;
        self.outside_year += other.outside_year;
        self.first_of_session_runs += other.first_of_session_runs;
        self.incomplete_runs += other.incomplete_runs;
        self.non_reference_runs += other.non_reference_runs;
        self.trailing_measurements += other.trailing_measurements;
        self.memory_excluded_windows += other.memory_excluded_windows;
        self.meteo_unmatched += other.meteo_unmatched;
    }

    pub fn total(&self) -> usize {
        self.parse_errors
            + self.slope_rejected
            + self.outside_year
            + self.first_of_session_runs
            + self.incomplete_runs
            + self.non_reference_runs
            + self.trailing_measurements
            + self.memory_excluded_windows
            + self.meteo_unmatched
    }

    /// Labelled non-zero counters, in pipeline order
    pub fn entries(&self) -> Vec<(&'static str, usize)> {
        [
            ("unparseable records", self.parse_errors),
            ("records with H2O slope out of range", self.slope_rejected),
            ("records outside the evaluated year", self.outside_year),
            ("first-of-session reference runs", self.first_of_session_runs),
            ("reference runs with wrong injection count", self.incomplete_runs),
            ("runs with unknown reference identifier", self.non_reference_runs),
            ("ambient injections in trailing partial window", self.trailing_measurements),
            ("windows excluded by memory effect", self.memory_excluded_windows),
            ("records without meteorological match", self.meteo_unmatched),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }
}

/// Processing statistics for a whole invocation
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub years_processed: usize,
    pub years_failed: Vec<i32>,
    pub records_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn is_success(&self) -> bool {
        self.years_failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deuterium_excess() {
        assert_eq!(deuterium_excess(-10.0, -70.0), 10.0);
        let record = CorrectedRecord::new(Timestamp::from_epoch_seconds(0).unwrap(), -12.5, -90.0, 8000.0);
        assert_eq!(record.d_excess, record.d2h - 8.0 * record.d18o);
    }

    #[test]
    fn test_skip_summary_merge_and_entries() {
        let mut a = SkipSummary {
            parse_errors: 2,
            memory_excluded_windows: 1,
            ..Default::default()
        };
        let b = SkipSummary {
            parse_errors: 1,
            incomplete_runs: 3,
            ..Default::default()
        };
        a.merge(&b);

        assert_eq!(a.parse_errors, 3);
        assert_eq!(a.total(), 7);
        let labels: Vec<_> = a.entries().into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], "unparseable records");
    }

    #[test]
    fn test_parse_stats_keeps_bounded_messages() {
        let mut stats = ParseStats::new();
        for i in 0..50 {
            stats.add_parse_error(format!("row {i}"));
        }
        assert_eq!(stats.parse_errors, 50);
        assert_eq!(stats.errors.len(), 20);
    }
}

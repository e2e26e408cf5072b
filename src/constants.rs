//! Instrument constants for the Picarro water-isotope analyzer
//!
//! This module contains the empirically calibrated correction tables,
//! reference material values, and processing defaults used throughout
//! the calibration pipeline.

// =============================================================================
// Injection (memory) correction tables
// =============================================================================

/// Additive δ18O correction (‰) for injections 1..=10 of a run
pub const D18O_INJECTION_CORRECTION: [f64; 10] = [
    0.174, 0.099, 0.061, 0.025, 0.000, 0.000, 0.000, 0.000, 0.000, 0.000,
];

/// Additive δ2H correction (‰) for injections 1..=10 of a run
pub const D2H_INJECTION_CORRECTION: [f64; 10] = [
    3.915, 1.463, 0.819, 0.504, 0.293, 0.222, 0.112, 0.000, 0.000, 0.000,
];

// =============================================================================
// Humidity dependence
// =============================================================================

/// Water concentration (ppm) the humidity correction is normalised to
pub const HUMIDITY_REFERENCE_PPM: f64 = 10_000.0;

/// Humidity response coefficients `(d0, A)` for δ18O
pub const D18O_HUMIDITY_COEFFICIENTS: (f64, f64) = (-2.33817, -2570.5);

/// Humidity response coefficients `(d0, A)` for δ2H
pub const D2H_HUMIDITY_COEFFICIENTS: (f64, f64) = (-42.251, -10964.2);

// =============================================================================
// Reference material and run layout
// =============================================================================

/// Certified δ18O of the laboratory reference material (‰)
pub const REFERENCE_TRUE_D18O: f64 = -8.65;

/// Certified δ2H of the laboratory reference material (‰)
pub const REFERENCE_TRUE_D2H: f64 = -61.55;

/// Injections the instrument performs per reference run
pub const DEFAULT_EXPECTED_INJECTIONS: usize = 10;

/// Leading injections discarded while the analyzer settles
pub const DEFAULT_SETTLING_DISCARD: usize = 4;

/// Consecutive ambient injections averaged into one window
pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// Seconds after a reference run during which ambient data carries memory
pub const DEFAULT_MEMORY_SKIP_SECS: i64 = 300;

/// Accepted range of the H2O fit slope for reference injections
pub const DEFAULT_SLOPE_MIN: f64 = 1.5;
pub const DEFAULT_SLOPE_MAX: f64 = 1.8;

/// Maximum distance between a corrected record and its meteorological match
pub const DEFAULT_METEO_TOLERANCE_SECS: i64 = 900;

/// Deuterium-excess slope: d = δ2H − 8·δ18O
pub const D_EXCESS_SLOPE: f64 = 8.0;

// =============================================================================
// Input discovery and output naming
// =============================================================================

/// Line that precedes the column header of the intermediate exports
pub const RAW_DATA_MARKER: &str = "Raw Data";

pub const DEFAULT_STANDARDS_PATTERN: &str = "Standards_eval_end_data*.txt";
pub const DEFAULT_AMBIENT_PATTERN: &str = "Ambient_data_*.txt";
pub const DEFAULT_METEO_PATTERN: &str = "*.csv";

/// Humidity bands reported in the yearly summary (ppm)
pub const HUMIDITY_BAND_LOW: f64 = 10_000.0;
pub const HUMIDITY_BAND_HIGH: f64 = 25_000.0;
pub const HUMIDITY_BAND_VERY_LOW: f64 = 7_000.0;

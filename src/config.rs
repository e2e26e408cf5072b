//! Configuration management and validation.
//!
//! Collects every instrument and calibration constant that the correction
//! pipeline needs into one struct, so a deployment can be recalibrated from
//! a TOML file instead of editing code.

use crate::constants::*;
use crate::error::{PicarroError, Result};
use crate::models::IsotopePair;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Accepted range of the H2O fit slope (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeRange {
    pub min: f64,
    pub max: f64,
}

impl SlopeRange {
    pub fn contains(&self, slope: f64) -> bool {
        slope >= self.min && slope <= self.max
    }
}

impl Default for SlopeRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_SLOPE_MIN,
            max: DEFAULT_SLOPE_MAX,
        }
    }
}

/// Supported output table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated text with three decimals
    #[default]
    Csv,
    /// Snappy-compressed Parquet
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Global configuration for calibration processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Injections a complete reference run must have
    pub expected_injections: usize,

    /// Leading injections of a reference run excluded from the average
    pub settling_discard: usize,

    /// Ambient injections averaged per window
    pub window_size: usize,

    /// Seconds after any reference run end during which ambient windows are dropped
    pub memory_skip_secs: i64,

    /// Certified values of the reference material
    pub reference_true: IsotopePair,

    /// Constant offset subtracted before drift correction (normally zero)
    pub baseline_offset: IsotopePair,

    /// Accepted H2O slope range for reference injections
    pub slope_range: SlopeRange,

    /// Reference identifiers accepted for calibration; empty accepts all
    pub reference_identifiers: Vec<String>,

    /// Maximum distance to a meteorological record when merging
    pub meteo_tolerance_secs: i64,

    /// Number of files parsed concurrently
    pub workers: usize,

    /// Output table format
    pub output_format: OutputFormat,

    /// File-name patterns used when an input path is a directory
    pub standards_pattern: String,
    pub ambient_pattern: String,
    pub meteo_pattern: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            expected_injections: DEFAULT_EXPECTED_INJECTIONS,
            settling_discard: DEFAULT_SETTLING_DISCARD,
            window_size: DEFAULT_WINDOW_SIZE,
            memory_skip_secs: DEFAULT_MEMORY_SKIP_SECS,
            reference_true: IsotopePair::new(REFERENCE_TRUE_D18O, REFERENCE_TRUE_D2H),
            baseline_offset: IsotopePair::default(),
            slope_range: SlopeRange::default(),
            reference_identifiers: Vec::new(),
            meteo_tolerance_secs: DEFAULT_METEO_TOLERANCE_SECS,
            workers: num_cpus::get().max(1),
            output_format: OutputFormat::default(),
            standards_pattern: DEFAULT_STANDARDS_PATTERN.to_string(),
            ambient_pattern: DEFAULT_AMBIENT_PATTERN.to_string(),
            meteo_pattern: DEFAULT_METEO_PATTERN.to_string(),
        }
    }
}

impl CalibrationConfig {
    /// Load a configuration file; missing keys fall back to defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PicarroError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default location of the user configuration file
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("picarro_processor").join("config.toml"))
    }

    /// Check the invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(PicarroError::configuration("window_size must be at least 1"));
        }
        if self.expected_injections < self.settling_discard + 2 {
            return Err(PicarroError::configuration(format!(
                "expected_injections ({}) must exceed settling_discard ({}) by at least 2",
                self.expected_injections, self.settling_discard
            )));
        }
        if self.memory_skip_secs < 0 {
            return Err(PicarroError::configuration(
                "memory_skip_secs must not be negative",
            ));
        }
        if self.meteo_tolerance_secs < 0 {
            return Err(PicarroError::configuration(
                "meteo_tolerance_secs must not be negative",
            ));
        }
        if self.slope_range.min > self.slope_range.max {
            return Err(PicarroError::configuration(format!(
                "slope_range is inverted: min {} > max {}",
                self.slope_range.min, self.slope_range.max
            )));
        }
        if self.workers == 0 {
            return Err(PicarroError::configuration("workers must be at least 1"));
        }
        Ok(())
    }

    /// Whether a run with this identifier is a reference run
    pub fn is_reference_identifier(&self, identifier: &str) -> bool {
        self.reference_identifiers.is_empty()
            || self
                .reference_identifiers
                .iter()
                .any(|known| known == identifier)
    }

    /// Injections averaged per reference run
    pub fn retained_injections(&self) -> usize {
        self.expected_injections.saturating_sub(self.settling_discard)
    }

    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_memory_skip_secs(mut self, seconds: i64) -> Self {
        self.memory_skip_secs = seconds;
        self
    }

    pub fn with_baseline_offset(mut self, offset: IsotopePair) -> Self {
        self.baseline_offset = offset;
        self
    }

    pub fn with_reference_identifiers(mut self, identifiers: Vec<String>) -> Self {
        self.reference_identifiers = identifiers;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_defaults_match_instrument_constants() {
        let config = CalibrationConfig::default();
        assert_eq!(config.expected_injections, 10);
        assert_eq!(config.settling_discard, 4);
        assert_eq!(config.retained_injections(), 6);
        assert_eq!(config.window_size, 60);
        assert_eq!(config.memory_skip_secs, 300);
        assert_eq!(config.reference_true, IsotopePair::new(-8.65, -61.55));
        assert!(config.baseline_offset.is_zero());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_slope_range_is_inclusive() {
        let range = SlopeRange::default();
        assert!(range.contains(1.5));
        assert!(range.contains(1.8));
        assert!(!range.contains(1.49));
        assert!(!range.contains(1.81));
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config = CalibrationConfig::from_toml_str(
            r#"
            window_size = 30
            output_format = "parquet"
            reference_identifiers = ["VE", "VE2"]

            [reference_true]
            d18o = -9.0
            d2h = -62.0
            "#,
        )
        .unwrap();

        assert_eq!(config.window_size, 30);
        assert_eq!(config.output_format, OutputFormat::Parquet);
        assert_eq!(config.reference_true.d18o, -9.0);
        assert_eq!(config.expected_injections, 10);
        assert!(config.is_reference_identifier("VE2"));
        assert!(!config.is_reference_identifier("GLW"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(CalibrationConfig::default().with_window_size(0).validate().is_err());
        assert!(CalibrationConfig::default().with_workers(0).validate().is_err());
        assert!(
            CalibrationConfig::default()
                .with_memory_skip_secs(-1)
                .validate()
                .is_err()
        );

        let config = CalibrationConfig {
            settling_discard: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let inverted = CalibrationConfig {
            slope_range: SlopeRange { min: 2.0, max: 1.0 },
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = CalibrationConfig::from_toml_str("window_size = \"sixty\"");
        assert!(matches!(result, Err(PicarroError::ConfigFile(_))));
    }

    #[test]
    fn test_output_format_values() {
        assert_eq!(OutputFormat::from_str("csv", false).unwrap(), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str("parquet", false).unwrap(),
            OutputFormat::Parquet
        );
        assert!(OutputFormat::from_str("xlsx", false).is_err());
        assert_eq!(OutputFormat::Parquet.extension(), "parquet");
    }
}

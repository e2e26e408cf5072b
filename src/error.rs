//! Error handling for isotope calibration operations.
//!
//! Provides error types with context for file ingestion, configuration
//! validation, and the calibration invariants that abort a year.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicarroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Input not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("No 'Raw Data' marker found in file: {path}")]
    NoDataMarker { path: PathBuf },

    #[error("Invalid timestamp code '{value}' (expected YYYYMMDDHHMMSS)")]
    InvalidTimestamp { value: String },

    #[error("Invalid injection index {index} (injections are numbered from 1)")]
    InvalidInjectionIndex { index: u32 },

    #[error(
        "No usable calibration points for year {year}: no reference run qualified, drift correction impossible"
    )]
    NoCalibrationPoints { year: i32 },

    #[error("No ambient measurements for year {year}")]
    NoAmbientData { year: i32 },

    #[error("No ambient measurements could be read from {files} ambient file(s)")]
    EmptyAmbientInput { files: usize },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },
}

impl PicarroError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error only invalidates a single year rather than the whole run
    pub fn is_year_scoped(&self) -> bool {
        matches!(
            self,
            Self::NoCalibrationPoints { .. } | Self::NoAmbientData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PicarroError>;

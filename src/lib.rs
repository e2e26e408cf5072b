//! Picarro Processor Library
//!
//! Calibrates water-isotope time series measured with a Picarro-class laser
//! analyzer. Reference-material injections are averaged into calibration
//! points, ambient readings are humidity-corrected, block-averaged and
//! drift-corrected against those points, and the result is merged with an
//! independently logged meteorological series.
//!
//! This library provides tools for:
//! - Reading the intermediate standards and ambient exports and station logs
//! - Injection, humidity, memory and drift corrections per calendar year
//! - Nearest-in-time merging with meteorological records
//! - Summary statistics (water lines, diurnal cycles, humidity bands)
//! - Writing CSV or Parquet output tables

pub mod calibration;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod meteo;
pub mod models;
pub mod processor;
pub mod summary;
pub mod timestamp;

pub use calibration::{YearResult, calibrate_year};
pub use config::{CalibrationConfig, OutputFormat};
pub use error::{PicarroError, Result};
pub use models::{CalibrationPoint, CorrectedRecord, Measurement, MeteoRecord, ProcessingStats};
pub use processor::{EvaluationProcessor, ProcessorInputs};
pub use timestamp::Timestamp;

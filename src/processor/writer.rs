//! Output table writing
//!
//! Every per-year result is turned into a polars [`DataFrame`] and written
//! as CSV with three decimals or as Snappy-compressed Parquet.

use crate::config::OutputFormat;
use crate::error::{PicarroError, Result};
use crate::models::{CalibrationPoint, CorrectedRecord, MergedRecord};

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes the per-year output tables into one directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf, format: OutputFormat) -> Self {
        Self { output_dir, format }
    }

    fn path_for(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", stem, self.format.extension()))
    }

    /// Corrected ambient series: Time, O18, H2, Dexcess, H2O
    pub fn write_corrected(&self, year: i32, records: &[CorrectedRecord]) -> Result<PathBuf> {
        let mut df = corrected_frame(records)?;
        let path = self.path_for(&format!("Ambient_data_{}_corr", year));
        self.write_frame(&mut df, &path)?;
        Ok(path)
    }

    /// Calibration points: Time, Identifier, O18, O18_sd, H2, H2_sd
    pub fn write_calibration(&self, year: i32, points: &[CalibrationPoint]) -> Result<PathBuf> {
        let mut df = df! {
            "Time" => points.iter().map(|p| p.timestamp.code()).collect::<Vec<_>>(),
            "Identifier" => points.iter().map(|p| p.identifier.clone()).collect::<Vec<_>>(),
            "O18" => points.iter().map(|p| p.d18o).collect::<Vec<_>>(),
            "O18_sd" => points.iter().map(|p| p.d18o_sd).collect::<Vec<_>>(),
            "H2" => points.iter().map(|p| p.d2h).collect::<Vec<_>>(),
            "H2_sd" => points.iter().map(|p| p.d2h_sd).collect::<Vec<_>>(),
        }?;
        let path = self.path_for(&format!("Standards_calibration_{}", year));
        self.write_frame(&mut df, &path)?;
        Ok(path)
    }

    /// Corrected series joined with the matched station records
    pub fn write_merged(&self, year: i32, merged: &[MergedRecord]) -> Result<PathBuf> {
        let records: Vec<CorrectedRecord> = merged.iter().map(|m| m.record).collect();
        let meteo = |f: fn(&MergedRecord) -> f64| merged.iter().map(f).collect::<Vec<_>>();

        let mut df = corrected_frame(&records)?.hstack(&[
            Column::new("windvel".into(), meteo(|m| m.meteo.wind_velocity)),
            Column::new("contemp".into(), meteo(|m| m.meteo.convective_temperature)),
            Column::new("rh1".into(), meteo(|m| m.meteo.relative_humidity_1)),
            Column::new("rh2".into(), meteo(|m| m.meteo.relative_humidity_2)),
            Column::new("grad".into(), meteo(|m| m.meteo.global_radiation)),
            Column::new("apress".into(), meteo(|m| m.meteo.air_pressure)),
            Column::new("ventemp".into(), meteo(|m| m.meteo.ventilated_temperature)),
            Column::new("winddir".into(), meteo(|m| m.meteo.wind_direction)),
            Column::new("prec".into(), meteo(|m| m.meteo.precipitation)),
        ])?;
        let path = self.path_for(&format!("Ambient_data_meteo_{}_corr", year));
        self.write_frame(&mut df, &path)?;
        Ok(path)
    }

    fn write_frame(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut file = File::create(path)?;

        match self.format {
            OutputFormat::Csv => CsvWriter::new(&mut file)
                .include_header(true)
                .with_float_precision(Some(3))
                .finish(df)
                .map_err(|e| PicarroError::ProcessingFailed {
                    path: path.to_path_buf(),
                    reason: format!("Failed to write CSV: {}", e),
                })?,
            OutputFormat::Parquet => {
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Snappy)
                    .finish(df)
                    .map_err(|e| PicarroError::ProcessingFailed {
                        path: path.to_path_buf(),
                        reason: format!("Failed to write parquet: {}", e),
                    })?;
            }
        }

        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }
}

fn corrected_frame(records: &[CorrectedRecord]) -> Result<DataFrame> {
    Ok(df! {
        "Time" => records.iter().map(|r| r.timestamp.code()).collect::<Vec<_>>(),
        "O18" => records.iter().map(|r| r.d18o).collect::<Vec<_>>(),
        "H2" => records.iter().map(|r| r.d2h).collect::<Vec<_>>(),
        "Dexcess" => records.iter().map(|r| r.d_excess).collect::<Vec<_>>(),
        "H2O" => records.iter().map(|r| r.water_ppm).collect::<Vec<_>>(),
    }?)
}

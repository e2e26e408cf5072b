//! Evaluation driver.
//!
//! Orchestrates a complete evaluation: file discovery, concurrent ingestion
//! of the three input streams, the per-year calibration pipeline, the
//! meteorological merge, summary statistics, and output writing.

pub mod discovery;
pub mod ingest;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::FileDiscovery;
use self::ingest::{ConcurrentReader, IngestOutcome};
use self::reader::{read_ambient_file, read_meteo_file, read_standards_file};
use self::writer::OutputWriter;

use crate::calibration::calibrate_year;
use crate::config::CalibrationConfig;
use crate::error::{PicarroError, Result};
use crate::meteo::merge_meteo;
use crate::models::{Measurement, MeteoRecord, ParsedFile, ProcessingStats, SkipSummary};
use crate::summary::YearSummary;

use colored::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Input paths of one evaluation
#[derive(Debug, Clone, Default)]
pub struct ProcessorInputs {
    pub standards: Vec<PathBuf>,
    pub ambient: Vec<PathBuf>,
    pub meteo: Vec<PathBuf>,
    /// Years to evaluate; empty means every year present in the ambient data
    pub years: Vec<i32>,
}

/// Runs the full evaluation for a set of inputs
#[derive(Debug)]
pub struct EvaluationProcessor {
    inputs: ProcessorInputs,
    output_dir: PathBuf,
    config: CalibrationConfig,
    show_progress: bool,
}

impl EvaluationProcessor {
    pub fn new(inputs: ProcessorInputs, output_dir: PathBuf) -> Self {
        Self {
            inputs,
            output_dir,
            config: CalibrationConfig::default(),
            show_progress: true,
        }
    }

    /// Configure the processor
    pub fn with_config(mut self, config: CalibrationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    async fn ingest_stream<T, F>(
        &self,
        label: &str,
        pattern: &str,
        inputs: &[PathBuf],
        parse: F,
    ) -> Result<IngestOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<ParsedFile<T>> + Clone + Send + Sync + 'static,
    {
        let files = FileDiscovery::new(pattern)?.discover(inputs)?;
        println!(
            "  {} {} {} files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold(),
            label
        );

        let reader = ConcurrentReader::new(self.config.workers).with_progress(self.show_progress);
        Ok(reader.read_all(label, &files, parse).await)
    }

    /// Main processing entry point
    ///
    /// A year whose calibration fails is reported in
    /// [`ProcessingStats::years_failed`] and produces no output; the other
    /// years are still evaluated.
    pub async fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        println!("{}", "Starting isotope evaluation".bright_green().bold());
        println!("  {} {}", "Output:".bright_cyan(), self.output_dir.display());

        // Step 1: Discover and read every input stream
        println!("\n{}", "Reading input files...".bright_yellow());
        let slope_range = self.config.slope_range;
        let standards = self
            .ingest_stream(
                "standards",
                &self.config.standards_pattern,
                &self.inputs.standards,
                move |path| read_standards_file(path, &slope_range),
            )
            .await?;
        let ambient = self
            .ingest_stream(
                "ambient",
                &self.config.ambient_pattern,
                &self.inputs.ambient,
                read_ambient_file,
            )
            .await?;
        let meteo = if self.inputs.meteo.is_empty() {
            None
        } else {
            Some(
                self.ingest_stream(
                    "meteo",
                    &self.config.meteo_pattern,
                    &self.inputs.meteo,
                    read_meteo_file,
                )
                .await?,
            )
        };

        let mut stats = ProcessingStats {
            output_path: self.output_dir.clone(),
            ..ProcessingStats::default()
        };
        stats.files_processed = standards.files.len()
            + ambient.files.len()
            + meteo.as_ref().map_or(0, |m| m.files.len());
        stats.files_failed = standards.failed.len()
            + ambient.failed.len()
            + meteo.as_ref().map_or(0, |m| m.failed.len());

        // Step 2: Ingestion-level skip counts
        let mut ingest_skips = SkipSummary::default();
        for parse in [standards.total_stats(), ambient.total_stats()]
            .into_iter()
            .chain(meteo.as_ref().map(|m| m.total_stats()))
        {
            ingest_skips.parse_errors += parse.parse_errors;
            ingest_skips.slope_rejected += parse.slope_rejected;
        }

        let ambient_files = ambient.files.len() + ambient.failed.len();
        let standards: Vec<Measurement> = standards.into_records();
        let ambient: Vec<Measurement> = ambient.into_records();
        let meteo: Option<Vec<MeteoRecord>> = meteo.map(|m| m.into_records());

        if ambient.is_empty() {
            return Err(PicarroError::EmptyAmbientInput {
                files: ambient_files,
            });
        }

        let years = self.years_to_evaluate(&ambient);
        ingest_skips.outside_year = standards
            .iter()
            .chain(&ambient)
            .filter(|m| !years.contains(&m.timestamp.year()))
            .count();
        info!(
            "Read {} reference injections and {} ambient readings; evaluating years {:?}",
            standards.len(),
            ambient.len(),
            years
        );

        // Step 3: Evaluate every year independently
        let writer = OutputWriter::new(self.output_dir.clone(), self.config.output_format);
        for &year in &years {
            println!("\n{} {}", "Evaluating year".bright_yellow(), year);

            let mut result = match calibrate_year(year, &standards, &ambient, &self.config) {
                Ok(result) => result,
                Err(e) => {
                    if e.is_year_scoped() {
                        warn!("Year {} not evaluated: {}", year, e);
                    } else {
                        error!("Year {} failed: {}", year, e);
                    }
                    println!("  {} {}", "Failed:".bright_red(), e.to_string().bright_red());
                    stats.years_failed.push(year);
                    continue;
                }
            };

            let merged = meteo.as_ref().map(|meteo| {
                merge_meteo(&result.records, meteo.clone(), self.config.meteo_tolerance_secs)
            });
            if let Some(merge) = &merged {
                result.skips.meteo_unmatched = merge.unmatched;
            }

            let summary = YearSummary::build(&result, merged.as_ref().map(|m| m.merged.as_slice()));
            summary.log();

            let corrected_path = writer.write_corrected(year, &result.records)?;
            writer.write_calibration(year, &result.calibration)?;
            if let Some(merge) = &merged {
                writer.write_merged(year, &merge.merged)?;
            }

            print_year_summary(&summary, &corrected_path);
            stats.years_processed += 1;
            stats.records_written += result.records.len();
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        print_run_summary(&stats, &ingest_skips);
        Ok(stats)
    }

    fn years_to_evaluate(&self, ambient: &[Measurement]) -> Vec<i32> {
        if !self.inputs.years.is_empty() {
            let years: BTreeSet<i32> = self.inputs.years.iter().copied().collect();
            return years.into_iter().collect();
        }
        let years: BTreeSet<i32> = ambient.iter().map(|m| m.timestamp.year()).collect();
        years.into_iter().collect()
    }
}

fn print_year_summary(summary: &YearSummary, output: &Path) {
    println!(
        "  {} {} corrected records from {} calibration points",
        "Wrote".bright_green(),
        summary.records.to_string().bright_white().bold(),
        summary.calibration.points.to_string().bright_white()
    );
    println!("  {} {}", "Output:".bright_cyan(), output.display());
    if let Some(fit) = &summary.water_line {
        println!(
            "  {} δ2H = {:.2} + {:.3}·δ18O",
            "LMWL:".bright_cyan(),
            fit.intercept,
            fit.slope
        );
    }
    for (label, count) in summary.skips.entries() {
        println!(
            "  {} {} {}",
            "Skipped".yellow(),
            count.to_string().bright_white(),
            label
        );
    }
}

fn print_run_summary(stats: &ProcessingStats, ingest_skips: &SkipSummary) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    for (label, count) in ingest_skips.entries() {
        println!(
            "  {} {} {}",
            "Skipped".yellow(),
            count.to_string().bright_white(),
            label
        );
    }
    println!(
        "  {} {}",
        "Years evaluated:".bright_cyan(),
        stats.years_processed.to_string().bright_white().bold()
    );
    if !stats.years_failed.is_empty() {
        println!(
            "  {} {:?}",
            "Years failed:".bright_red(),
            stats.years_failed
        );
    }
    println!(
        "  {} {}",
        "Records written:".bright_cyan(),
        stats.records_written.to_string().bright_white().bold()
    );
}

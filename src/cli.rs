//! Command-line interface components.

use crate::config::{CalibrationConfig, OutputFormat};
use crate::models::ProcessingStats;
use crate::processor::{EvaluationProcessor, ProcessorInputs};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "picarro_processor")]
#[command(about = "Calibrate Picarro water-isotope exports against reference standards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Standards export files or directories containing them
    #[arg(long, required = true, num_args = 1.., value_name = "PATH")]
    pub standards: Vec<PathBuf>,

    /// Ambient export files or directories containing them
    #[arg(long, required = true, num_args = 1.., value_name = "PATH")]
    pub ambient: Vec<PathBuf>,

    /// Meteorological station logs or directories containing them
    #[arg(long, num_args = 1.., value_name = "PATH")]
    pub meteo: Vec<PathBuf>,

    /// Year to evaluate (repeatable; default: every year in the ambient data)
    #[arg(long = "year", value_name = "YYYY")]
    pub years: Vec<i32>,

    /// Output directory for corrected tables
    #[arg(short, long, default_value = "End")]
    pub output: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output table format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of files read concurrently
    #[arg(long)]
    pub workers: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors, without progress bars
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Defaults, then the configuration file, then command-line overrides
    pub fn load_config(&self) -> Result<CalibrationConfig> {
        let mut config = match &self.config {
            Some(path) => CalibrationConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => match CalibrationConfig::default_config_path().filter(|p| p.exists()) {
                Some(path) => CalibrationConfig::from_toml_file(&path).with_context(|| {
                    format!("Failed to load configuration from {}", path.display())
                })?,
                None => CalibrationConfig::default(),
            },
        };

        if let Some(format) = self.format {
            config = config.with_output_format(format);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn inputs(&self) -> ProcessorInputs {
        ProcessorInputs {
            standards: self.standards.clone(),
            ambient: self.ambient.clone(),
            meteo: self.meteo.clone(),
            years: self.years.clone(),
        }
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("picarro_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Run a complete evaluation for the parsed arguments
pub async fn run(args: Args) -> Result<ProcessingStats> {
    let config = args.load_config()?;
    debug!("Loaded configuration: {:?}", config);

    let processor = EvaluationProcessor::new(args.inputs(), args.output.clone())
        .with_config(config)
        .with_progress(!args.quiet);

    processor
        .process()
        .await
        .context("Evaluation failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_arguments() {
        let args = Args::try_parse_from([
            "picarro_processor",
            "--standards",
            "std_a.txt",
            "std_b.txt",
            "--ambient",
            "amb",
            "--year",
            "2020",
            "--year",
            "2021",
            "--format",
            "parquet",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.standards.len(), 2);
        assert_eq!(args.years, vec![2020, 2021]);
        assert!(args.meteo.is_empty());
        assert_eq!(args.output, PathBuf::from("End"));
        assert_eq!(args.format, Some(OutputFormat::Parquet));
        assert_eq!(args.get_log_level(), "debug");
    }

    #[test]
    fn test_required_inputs() {
        assert!(Args::try_parse_from(["picarro_processor", "--ambient", "a"]).is_err());
        assert!(Args::try_parse_from([
            "picarro_processor",
            "--standards",
            "s",
            "--ambient",
            "a",
            "--format",
            "xlsx"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window_size = 30\nworkers = 2\noutput_format = \"csv\"").unwrap();
        file.flush().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::try_parse_from([
            "picarro_processor",
            "--standards",
            "s",
            "--ambient",
            "a",
            "--config",
            &path,
            "--format",
            "parquet",
            "--workers",
            "3",
        ])
        .unwrap();
        let config = args.load_config().unwrap();

        assert_eq!(config.window_size, 30);
        assert_eq!(config.workers, 3);
        assert_eq!(config.output_format, OutputFormat::Parquet);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::try_parse_from([
            "picarro_processor",
            "--standards",
            "s",
            "--ambient",
            "a",
            "--workers",
            "0",
        ])
        .unwrap();

        assert!(args.load_config().is_err());
    }
}

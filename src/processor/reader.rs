//! Record readers for the standards, ambient, and meteorological inputs
//!
//! A row that fails to parse is counted and skipped; only a file that cannot
//! be opened or has no data section is an error.

use crate::config::SlopeRange;
use crate::header::parse_export_header;
use crate::models::{
    Measurement, MeteoRecord, ParseStats, ParsedFile, RunTag,
};
use crate::error::Result;
use crate::timestamp::Timestamp;

use csv::StringRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Column positions of the standards export
mod standards_col {
    pub const TIME: usize = 0;
    pub const ANALYSIS: usize = 1;
    pub const PORT: usize = 2;
    pub const IDENTIFIER: usize = 3;
    pub const INJECTION: usize = 5;
    pub const H2O_MEAN: usize = 6;
    pub const O18: usize = 8;
    pub const H2: usize = 10;
    pub const H2O_SLOPE: usize = 14;
    pub const FIRST: usize = 15;
}

/// Column positions of the ambient export
mod ambient_col {
    pub const TIME: usize = 0;
    pub const PORT: usize = 1;
    pub const H2O_MEAN: usize = 2;
    pub const O18: usize = 3;
    pub const H2: usize = 4;
}

/// Column positions of the station log
mod meteo_col {
    pub const INTERVAL: usize = 0;
    pub const WIND_VELOCITY: usize = 1;
    pub const CONVECTIVE_TEMPERATURE: usize = 2;
    pub const RELATIVE_HUMIDITY_1: usize = 3;
    pub const RELATIVE_HUMIDITY_2: usize = 4;
    pub const GLOBAL_RADIATION: usize = 5;
    pub const AIR_PRESSURE: usize = 6;
    pub const VENTILATED_TEMPERATURE: usize = 10;
    pub const WIND_DIRECTION: usize = 11;
    pub const PRECIPITATION: usize = 12;
}

type FieldResult<T> = std::result::Result<T, String>;

fn get_field<'a>(record: &'a StringRecord, index: usize, name: &str) -> FieldResult<&'a str> {
    match record.get(index).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(format!("empty value for column '{}'", name)),
        None => Err(format!("missing column '{}'", name)),
    }
}

fn parse_f64(record: &StringRecord, index: usize, name: &str) -> FieldResult<f64> {
    let value = get_field(record, index, name)?;
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("non-finite value for {}: '{}'", name, value)),
        Err(e) => Err(format!("invalid number for {}: '{}' ({})", name, value, e)),
    }
}

fn parse_u32(record: &StringRecord, index: usize, name: &str) -> FieldResult<u32> {
    let value = get_field(record, index, name)?;
    value
        .parse::<u32>()
        .map_err(|e| format!("invalid integer for {}: '{}' ({})", name, value, e))
}

fn parse_code(record: &StringRecord, index: usize) -> FieldResult<Timestamp> {
    let value = get_field(record, index, "Time")?;
    Timestamp::from_code(value).map_err(|e| e.to_string())
}

/// CSV reader positioned on the first data row of an export
fn export_reader(file_path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    let (metadata, boundaries) = parse_export_header(file_path)?;
    debug!(
        "{}: {} export evaluated {} from {} raw files, {} data rows",
        file_path.display(),
        metadata.export_type.as_deref().unwrap_or("untyped"),
        metadata.evaluated_at.as_deref().unwrap_or("at an unknown date"),
        metadata.files_evaluated.len(),
        boundaries.data_rows
    );

    let mut reader = BufReader::new(File::open(file_path)?);
    let mut line = String::new();
    // Preamble lines plus the column header
    for _ in 0..=boundaries.skip_rows {
        line.clear();
        reader.read_line(&mut line)?;
    }

    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader))
}

/// Feed every row through `parse`, counting rows that fail
fn collect_rows<R: std::io::Read, T>(
    file_path: &Path,
    reader: &mut csv::Reader<R>,
    mut parse: impl FnMut(&StringRecord, &mut ParseStats) -> FieldResult<Option<T>>,
) -> ParsedFile<T> {
    let mut records = Vec::new();
    let mut stats = ParseStats::new();

    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                stats.total_records += 1;
                stats.add_parse_error(format!("row {}: {}", row + 1, e));
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        stats.total_records += 1;

        match parse(&record, &mut stats) {
            Ok(Some(value)) => {
                records.push(value);
                stats.parsed += 1;
            }
            Ok(None) => {}
            Err(message) => {
                debug!("{} row {}: {}", file_path.display(), row + 1, message);
                stats.add_parse_error(format!("row {}: {}", row + 1, message));
            }
        }
    }

    if stats.parse_errors > 0 {
        warn!(
            "{}: skipped {} of {} rows that failed to parse",
            file_path.display(),
            stats.parse_errors,
            stats.total_records
        );
    }

    ParsedFile { records, stats }
}

fn parse_standards_row(
    record: &StringRecord,
    slope_range: &SlopeRange,
) -> FieldResult<Option<Measurement>> {
    use standards_col::*;

    let slope = parse_f64(record, H2O_SLOPE, "H2O sl")?;
    if !slope_range.contains(slope) {
        return Ok(None);
    }

    let first = get_field(record, FIRST, "first")?;
    Ok(Some(Measurement {
        timestamp: parse_code(record, TIME)?,
        port: get_field(record, PORT, "Port")?.to_string(),
        water_ppm: parse_f64(record, H2O_MEAN, "H2O mean")?,
        d18o: parse_f64(record, O18, "O18")?,
        d2h: parse_f64(record, H2, "H2")?,
        run: Some(RunTag {
            analysis: get_field(record, ANALYSIS, "Analysis")?.to_string(),
            identifier: get_field(record, IDENTIFIER, "Identifier")?.to_string(),
            injection: parse_u32(record, INJECTION, "Inj_nmb")?,
            first_of_session: first == "1",
        }),
    }))
}

/// Read a standards export, dropping rows whose H2O slope is outside `slope_range`
pub fn read_standards_file(
    file_path: &Path,
    slope_range: &SlopeRange,
) -> Result<ParsedFile<Measurement>> {
    let mut reader = export_reader(file_path)?;
    let parsed = collect_rows(file_path, &mut reader, |record, stats| {
        let row = parse_standards_row(record, slope_range)?;
        if row.is_none() {
            stats.slope_rejected += 1;
        }
        Ok(row)
    });

    debug!(
        "{}: {} reference injections, {} rejected for H2O slope",
        file_path.display(),
        parsed.records.len(),
        parsed.stats.slope_rejected
    );
    Ok(parsed)
}

/// Read an ambient export
pub fn read_ambient_file(file_path: &Path) -> Result<ParsedFile<Measurement>> {
    use ambient_col::*;

    let mut reader = export_reader(file_path)?;
    Ok(collect_rows(file_path, &mut reader, |record, _| {
        let mut measurement = Measurement::ambient(
            parse_code(record, TIME)?,
            parse_f64(record, H2O_MEAN, "H2O mean")?,
            parse_f64(record, O18, "O18")?,
            parse_f64(record, H2, "H2")?,
        );
        measurement.port = get_field(record, PORT, "Port")?.to_string();
        Ok(Some(measurement))
    }))
}

/// Read a `;`-separated station log with a single header line
pub fn read_meteo_file(file_path: &Path) -> Result<ParsedFile<MeteoRecord>> {
    use meteo_col::*;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_path(file_path)?;

    Ok(collect_rows(file_path, &mut reader, |record, _| {
        let interval = get_field(record, INTERVAL, "interval")?;
        Ok(Some(MeteoRecord {
            timestamp: Timestamp::from_interval(interval).map_err(|e| e.to_string())?,
            wind_velocity: parse_f64(record, WIND_VELOCITY, "windvel")?,
            convective_temperature: parse_f64(record, CONVECTIVE_TEMPERATURE, "contemp")?,
            relative_humidity_1: parse_f64(record, RELATIVE_HUMIDITY_1, "rh1")?,
            relative_humidity_2: parse_f64(record, RELATIVE_HUMIDITY_2, "rh2")?,
            global_radiation: parse_f64(record, GLOBAL_RADIATION, "grad")?,
            air_pressure: parse_f64(record, AIR_PRESSURE, "apress")?,
            ventilated_temperature: parse_f64(record, VENTILATED_TEMPERATURE, "ventemp")?,
            wind_direction: parse_f64(record, WIND_DIRECTION, "winddir")?,
            precipitation: parse_f64(record, PRECIPITATION, "prec")?,
        }))
    }))
}

//! Export header parsing and data section location.
//!
//! The intermediate standards and ambient exports start with a free-form
//! preamble (evaluation date, export type, list of evaluated raw files),
//! followed by a `Raw Data` marker, a separator line, and the column header.
//! This module extracts the preamble metadata and the number of lines to
//! skip before handing the file to the CSV reader.

use crate::constants::RAW_DATA_MARKER;
use crate::error::{PicarroError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Metadata found in the preamble of an export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMetadata {
    /// Free-text evaluation date written by the exporter
    pub evaluated_at: Option<String>,
    /// Export type, e.g. `Standards` or `Ambient`
    pub export_type: Option<String>,
    /// Raw analyzer files the export was assembled from
    pub files_evaluated: Vec<String>,
}

/// Line offsets of the data section
#[derive(Debug, Clone, PartialEq)]
pub struct DataBoundaries {
    /// Lines preceding the column header line
    pub skip_rows: usize,
    /// Non-empty lines after the column header
    pub data_rows: usize,
    pub total_lines: usize,
}

/// Extract preamble metadata and data boundaries from an export file
pub fn parse_export_header(file_path: &Path) -> Result<(ExportMetadata, DataBoundaries)> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);

    let mut metadata = ExportMetadata::default();
    let mut marker_line = None;
    let mut header_line = None;
    let mut in_file_list = false;
    let mut data_rows = 0;
    let mut total_lines = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        total_lines = line_num + 1;
        let trimmed = line.trim();

        if header_line.is_some() {
            if !trimmed.is_empty() {
                data_rows += 1;
            }
            continue;
        }

        if marker_line.is_some() {
            // Separator and blank lines sit between the marker and the column header
            if trimmed.is_empty() || is_separator(trimmed) {
                continue;
            }
            header_line = Some(line_num);
            continue;
        }

        if trimmed == RAW_DATA_MARKER {
            marker_line = Some(line_num);
            continue;
        }

        parse_preamble_line(trimmed, &mut metadata, &mut in_file_list);
    }

    if marker_line.is_none() {
        return Err(PicarroError::NoDataMarker {
            path: file_path.to_path_buf(),
        });
    }

    let skip_rows = header_line.ok_or_else(|| PicarroError::ProcessingFailed {
        path: file_path.to_path_buf(),
        reason: "column header missing after data marker".to_string(),
    })?;

    let boundaries = DataBoundaries {
        skip_rows,
        data_rows,
        total_lines,
    };

    debug!(
        "Parsed header for {}: skip_rows={}, data_rows={}",
        file_path.display(),
        skip_rows,
        data_rows
    );

    Ok((metadata, boundaries))
}

fn parse_preamble_line(line: &str, metadata: &mut ExportMetadata, in_file_list: &mut bool) {
    if line.is_empty() || is_separator(line) {
        *in_file_list = false;
        return;
    }

    if let Some(value) = line.strip_prefix("Evaluation from:") {
        metadata.evaluated_at = Some(value.trim().to_string());
        *in_file_list = false;
    } else if let Some(value) = line.strip_prefix("Type:") {
        metadata.export_type = Some(value.trim().to_string());
        *in_file_list = false;
    } else if line.starts_with("Files evaluated:") {
        *in_file_list = true;
    } else if *in_file_list {
        metadata.files_evaluated.push(line.to_string());
    }
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| c == '=' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_header_parsing() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Evaluation from: Mon Jan  3 10:12:01 2022").unwrap();
        writeln!(temp_file, "Type: Standards").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "Files evaluated: ").unwrap();
        writeln!(temp_file, "HIDS2254-20210105-000012Z-DataLog_User.csv").unwrap();
        writeln!(temp_file, "HIDS2254-20210106-000011Z-DataLog_User.csv").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "========================").unwrap();
        writeln!(temp_file, "Raw Data").unwrap();
        writeln!(temp_file, "========================").unwrap();
        writeln!(temp_file, "Time,Analaysis No,Port").unwrap();
        writeln!(temp_file, "20210105101010,12,2-1").unwrap();
        writeln!(temp_file, "20210105101110,12,2-1").unwrap();

        let (metadata, boundaries) = parse_export_header(temp_file.path()).unwrap();

        assert_eq!(metadata.export_type.as_deref(), Some("Standards"));
        assert_eq!(
            metadata.evaluated_at.as_deref(),
            Some("Mon Jan  3 10:12:01 2022")
        );
        assert_eq!(metadata.files_evaluated.len(), 2);
        assert_eq!(boundaries.skip_rows, 10);
        assert_eq!(boundaries.data_rows, 2);
        assert_eq!(boundaries.total_lines, 13);
    }

    #[test]
    fn test_missing_marker() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Time,O18,H2").unwrap();
        writeln!(temp_file, "20210105101010,-12.1,-88.0").unwrap();

        let result = parse_export_header(temp_file.path());
        assert!(matches!(result, Err(PicarroError::NoDataMarker { .. })));
    }

    #[test]
    fn test_marker_without_column_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Raw Data").unwrap();
        writeln!(temp_file, "==========").unwrap();

        let result = parse_export_header(temp_file.path());
        assert!(matches!(result, Err(PicarroError::ProcessingFailed { .. })));
    }
}

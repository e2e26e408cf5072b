//! Input file discovery
//!
//! Inputs are given as files or directories. Files are taken as they are;
//! directories are walked recursively and filtered by a file-name glob.

use crate::error::{PicarroError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolves input paths for one stream (standards, ambient, or meteo)
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    pattern: Pattern,
}

impl FileDiscovery {
    /// Create a discovery for directory inputs matching `pattern`
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern).map_err(|e| {
            PicarroError::configuration(format!("invalid file pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { pattern })
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.pattern.matches(name))
    }

    /// Expand `inputs` into a sorted, de-duplicated list of files
    pub fn discover(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            if !input.exists() {
                return Err(PicarroError::InputNotFound {
                    path: input.clone(),
                });
            }

            if input.is_file() {
                files.push(input.clone());
                continue;
            }

            let before = files.len();
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = entry.map_err(|e| PicarroError::ProcessingFailed {
                    path: input.clone(),
                    reason: format!("directory walk failed: {}", e),
                })?;
                if entry.file_type().is_file() && self.matches(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            debug!(
                "Found {} files matching '{}' in {}",
                files.len() - before,
                self.pattern,
                input.display()
            );
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

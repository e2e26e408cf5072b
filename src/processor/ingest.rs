//! Concurrent file ingestion
//!
//! Files are parsed on a bounded pool of blocking tasks and collected into a
//! map keyed by path, so downstream stages see a deterministic order no
//! matter which file finished first.

use crate::error::{PicarroError, Result};
use crate::models::{ParseStats, ParsedFile};

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{debug, error};

/// Parsed files of one stream plus the files that could not be read
#[derive(Debug)]
pub struct IngestOutcome<T> {
    pub files: BTreeMap<PathBuf, ParsedFile<T>>,
    pub failed: Vec<(PathBuf, String)>,
}

impl<T> Default for IngestOutcome<T> {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> IngestOutcome<T> {
    /// Parse statistics summed over all files
    pub fn total_stats(&self) -> ParseStats {
        self.files.values().fold(ParseStats::new(), |mut total, file| {
            total.total_records += file.stats.total_records;
            total.parsed += file.stats.parsed;
            total.parse_errors += file.stats.parse_errors;
            total.slope_rejected += file.stats.slope_rejected;
            total
        })
    }

    /// All records, file by file in path order
    pub fn into_records(self) -> Vec<T> {
        self.files
            .into_values()
            .flat_map(|file| file.records)
            .collect()
    }
}

/// Reads many files concurrently with a fixed worker limit
#[derive(Debug, Clone)]
pub struct ConcurrentReader {
    semaphore: Arc<Semaphore>,
    workers: usize,
    show_progress: bool,
}

impl ConcurrentReader {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(format!("Reading {} files", label));
        pb
    }

    /// Parse every file in `files` with `parse`
    ///
    /// A file that fails is logged and recorded in
    /// [`IngestOutcome::failed`]; it never aborts the others.
    pub async fn read_all<T, F>(&self, label: &str, files: &[PathBuf], parse: F) -> IngestOutcome<T>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<ParsedFile<T>> + Clone + Send + Sync + 'static,
    {
        let pb = self.progress_bar(files.len(), label);
        let concurrent_limit = self.workers.min(files.len()).max(1);

        let results = stream::iter(files.iter().cloned())
            .map(|path| {
                let semaphore = self.semaphore.clone();
                let parse = parse.clone();
                let pb = pb.clone();
                async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => {
                            let task_path = path.clone();
                            task::spawn_blocking(move || parse(&task_path))
                                .await
                                .map_err(|e| PicarroError::ProcessingFailed {
                                    path: path.clone(),
                                    reason: format!("reader task failed: {}", e),
                                })
                                .and_then(|parsed| parsed)
                        }
                        Err(e) => Err(PicarroError::ProcessingFailed {
                            path: path.clone(),
                            reason: format!("failed to acquire reader permit: {}", e),
                        }),
                    };
                    pb.inc(1);
                    (path, result)
                }
            })
            .buffer_unordered(concurrent_limit)
            .collect::<Vec<_>>()
            .await;

        let mut outcome = IngestOutcome::default();
        for (path, result) in results {
            match result {
                Ok(parsed) => {
                    debug!(
                        "Read {} records from {} ({:.1}% of rows)",
                        parsed.records.len(),
                        path.display(),
                        parsed.stats.success_rate()
                    );
                    outcome.files.insert(path, parsed);
                }
                Err(e) => {
                    error!("Failed to read {}: {}", path.display(), e);
                    outcome.failed.push((path, e.to_string()));
                }
            }
        }
        outcome.failed.sort();

        pb.finish_with_message(format!("{} files read", label));
        outcome
    }
}

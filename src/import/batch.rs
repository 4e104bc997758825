//! Parallel batch analysis of activity files using rayon
//!
//! Each file goes through its own import → normalize → metrics pass with no
//! shared state, so files are processed independently on the rayon pool.
//! A failing file is recorded in the summary and never stops the batch.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Result, RunStackError};
use crate::import::{ImportManager, MetricsReport};

/// Configuration for batch analysis
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of worker threads (None = rayon default, one per CPU)
    pub num_threads: Option<usize>,
    /// Show progress bar while analyzing
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            show_progress: true,
        }
    }
}

/// Outcome for a single file
#[derive(Debug, Clone)]
pub struct FileAnalysisResult {
    /// Path to the file that was processed
    pub file_path: PathBuf,
    /// Metrics when the file could be read
    pub report: Option<MetricsReport>,
    /// Duration in milliseconds for this file
    pub duration_ms: u128,
    /// Error message if the file could not be read
    pub error: Option<String>,
}

impl FileAnalysisResult {
    pub fn is_success(&self) -> bool {
        self.report.is_some()
    }
}

/// Summary of a batch run; `results` follow input order
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub total_duration_ms: u128,
    pub results: Vec<FileAnalysisResult>,
}

impl BatchSummary {
    /// Check if every file was analyzed
    pub fn is_fully_successful(&self) -> bool {
        self.failed_files == 0
    }

    /// Reports of the successfully analyzed files
    pub fn reports(&self) -> Vec<&MetricsReport> {
        self.results.iter().filter_map(|r| r.report.as_ref()).collect()
    }

    /// Failed files with their error messages
    pub fn errors(&self) -> Vec<(&Path, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.error.as_deref().map(|e| (r.file_path.as_path(), e)))
            .collect()
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Analysis Summary\n  \
             Total Files: {}\n  \
             Successful: {}\n  \
             Failed: {}\n  \
             Total Time: {:.2}s",
            self.total_files,
            self.successful_files,
            self.failed_files,
            self.total_duration_ms as f64 / 1000.0,
        )
    }
}

/// Batch analyzer over an [`ImportManager`]
pub struct BatchAnalyzer {
    pub config: BatchConfig,
    manager: ImportManager,
}

impl BatchAnalyzer {
    pub fn new() -> Self {
        Self::with_config(BatchConfig::default())
    }

    pub fn with_config(config: BatchConfig) -> Self {
        Self {
            config,
            manager: ImportManager::new(),
        }
    }

    /// Analyze the given files in parallel
    pub fn analyze_files(&self, file_paths: &[PathBuf]) -> Result<BatchSummary> {
        let start_time = Instant::now();
        info!("Starting batch analysis of {} files", file_paths.len());

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(file_paths.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                    .map_err(|e| RunStackError::Internal(e.to_string()))?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let results = match self.config.num_threads {
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| RunStackError::Internal(format!("Failed to create thread pool: {}", e)))?;
                pool.install(|| self.process_files_parallel(file_paths, &progress))
            }
            None => self.process_files_parallel(file_paths, &progress),
        };

        if let Some(pb) = progress {
            pb.finish_with_message("Complete");
        }

        let successful_files = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total_files: file_paths.len(),
            successful_files,
            failed_files: results.len() - successful_files,
            total_duration_ms: start_time.elapsed().as_millis(),
            results,
        };

        info!("{}", summary.to_string_pretty());
        Ok(summary)
    }

    /// Analyze every importable file in a directory (non-recursive)
    pub fn analyze_directory(&self, dir_path: &Path) -> Result<BatchSummary> {
        debug!("Scanning directory for activity files: {:?}", dir_path);

        if !dir_path.is_dir() {
            return Err(RunStackError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Path is not a directory: {}", dir_path.display()),
            )));
        }

        let files = self.manager.collect_importable_files(dir_path)?;
        if files.is_empty() {
            warn!("No activity files found in directory: {}", dir_path.display());
            return Ok(BatchSummary::default());
        }

        info!("Found {} activity files in directory", files.len());
        self.analyze_files(&files)
    }

    fn process_files_parallel(
        &self,
        file_paths: &[PathBuf],
        progress: &Option<ProgressBar>,
    ) -> Vec<FileAnalysisResult> {
        file_paths
            .par_iter()
            .map(|file_path| {
                let file_start = Instant::now();
                let outcome = self.manager.analyze_file(file_path);
                let duration_ms = file_start.elapsed().as_millis();

                let result = match outcome {
                    Ok(analysis) => FileAnalysisResult {
                        file_path: file_path.clone(),
                        report: Some(MetricsReport::from(&analysis)),
                        duration_ms,
                        error: None,
                    },
                    Err(e) => {
                        warn!("Failed to analyze {:?}: {}", file_path, e);
                        FileAnalysisResult {
                            file_path: file_path.clone(),
                            report: None,
                            duration_ms,
                            error: Some(e.user_message()),
                        }
                    }
                };

                if let Some(pb) = progress {
                    pb.set_message(
                        file_path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .to_string(),
                    );
                    pb.inc(1);
                }

                result
            })
            .collect()
    }
}

impl Default for BatchAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quiet(threads: Option<usize>) -> BatchAnalyzer {
        BatchAnalyzer::with_config(BatchConfig {
            num_threads: threads,
            show_progress: false,
        })
    }

    #[test]
    fn test_results_follow_input_order_and_failures_are_kept() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(&good, "heart_rate,speed\n150,3.0\n150,3.5\n").unwrap();
        let missing = dir.path().join("missing.fit");
        let unsupported = dir.path().join("route.gpx");

        let files = vec![missing.clone(), good.clone(), unsupported.clone()];
        let summary = quiet(Some(2)).analyze_files(&files).unwrap();

        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.successful_files, 1);
        assert_eq!(summary.failed_files, 2);
        assert!(!summary.is_fully_successful());

        let paths: Vec<_> = summary.results.iter().map(|r| r.file_path.clone()).collect();
        assert_eq!(paths, files);

        let reports = summary.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].metrics.avg_hr, Some(150.0));
        assert_eq!(reports[0].metrics.pace_hr_ratio, Some(0.02));
        assert_eq!(summary.errors().len(), 2);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let summary = quiet(None).analyze_directory(dir.path()).unwrap();
        assert_eq!(summary.total_files, 0);
        assert!(summary.is_fully_successful());
    }

    #[test]
    fn test_not_a_directory() {
        assert!(quiet(None).analyze_directory(Path::new("/nonexistent/dir")).is_err());
    }
}

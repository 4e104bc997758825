use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ImportExportError, Result};
use crate::metrics::compute_metrics;
use crate::models::{NormalizedSeries, PerformanceMetrics, RawRecord};
use crate::series::normalize;

pub mod batch;
pub mod csv;
pub mod fit;

/// Trait for reading raw sample records from different file formats
pub trait ImportFormat: Send + Sync {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read one raw record per captured sample, in file order
    fn read_records(&self, file_path: &Path) -> Result<Vec<RawRecord>>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Normalized series and metrics for one activity file
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityAnalysis {
    pub source: PathBuf,
    pub series: NormalizedSeries,
    pub metrics: PerformanceMetrics,
}

/// Metrics of one analyzed file, without the series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub source: String,
    pub samples: usize,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
}

impl From<&ActivityAnalysis> for MetricsReport {
    fn from(analysis: &ActivityAnalysis) -> Self {
        Self {
            source: analysis.source.display().to_string(),
            samples: analysis.series.len(),
            metrics: analysis.metrics,
        }
    }
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(fit::FitImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self { importers }
    }

    fn importer_for(&self, file_path: &Path) -> Result<&dyn ImportFormat> {
        self.importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .map(|importer| importer.as_ref())
            .ok_or_else(|| {
                ImportExportError::UnsupportedFormat {
                    format: file_path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .unwrap_or("<none>")
                        .to_string(),
                }
                .into()
            })
    }

    /// Read raw records from a file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        let importer = self.importer_for(file_path)?;
        debug!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            "Importing activity file"
        );
        importer.read_records(file_path)
    }

    /// Import, normalize and compute metrics for one file
    pub fn analyze_file(&self, file_path: &Path) -> Result<ActivityAnalysis> {
        let records = self.import_file(file_path)?;
        let series = normalize(&records);
        let metrics = compute_metrics(&series);

        info!(
            file = %file_path.display(),
            samples = series.len(),
            defined_metrics = metrics.defined_count(),
            "Analyzed activity"
        );

        Ok(ActivityAnalysis {
            source: file_path.to_path_buf(),
            series,
            metrics,
        })
    }

    /// Collect all files in a directory that some importer can read, sorted by path
    pub fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in std::fs::read_dir(dir_path)? {
            let path = entry?.path();
            if path.is_file() && self.can_import_file(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

//! Unified error hierarchy for RunStack
//!
//! Metric computation never fails; these errors cover the file and format
//! handling around it (FIT decoding, CSV import/export, activity listings).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all RunStack I/O operations
#[derive(Debug, Error)]
pub enum RunStackError {
    /// FIT file decoding errors
    #[error("FIT parsing error: {0}")]
    Fit(#[from] FitError),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// FIT file decoding specific errors
#[derive(Debug, Error)]
pub enum FitError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File is corrupted or not a FIT file
    #[error("Corrupted file: {reason}")]
    Corrupted { reason: String },

    /// File decoded but holds no record messages
    #[error("No record messages in {path}")]
    NoRecords { path: PathBuf },
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

/// Result type alias for RunStack operations
pub type Result<T> = std::result::Result<T, RunStackError>;

impl RunStackError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RunStackError::Fit(FitError::FileNotFound { .. }) => ErrorSeverity::Warning,
            RunStackError::Fit(FitError::NoRecords { .. }) => ErrorSeverity::Warning,
            RunStackError::Configuration(_) => ErrorSeverity::Error,
            RunStackError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RunStackError::Fit(FitError::FileNotFound { path }) => {
                format!("Could not find activity file: {}", path.display())
            }
            RunStackError::Fit(FitError::Corrupted { reason }) => {
                format!("Activity file is corrupted: {}", reason)
            }
            RunStackError::Fit(FitError::NoRecords { path }) => {
                format!("Activity file {} contains no samples", path.display())
            }
            RunStackError::ImportExport(ImportExportError::UnsupportedFormat { format }) => {
                format!("Unsupported file type '{}'. Use .fit or .csv files.", format)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

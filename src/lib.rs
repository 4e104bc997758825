// Library interface for RunStack modules
// Integration tests and the CLI both go through these exports

pub mod activity;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod series;

// Re-export commonly used types for convenience
pub use models::*;
pub use metrics::compute_metrics;
pub use series::normalize;
pub use activity::{ActivityFilter, ActivityMetadata, ActivityRow};
pub use import::{ActivityAnalysis, ImportManager, MetricsReport};
pub use error::{RunStackError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};

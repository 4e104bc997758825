use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ImportExportError;

pub mod csv;
pub mod text;

/// Output formats for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl FromStr for ExportFormat {
    type Err = ImportExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Render an optional metric for tabular or textual output
pub(crate) fn format_metric(value: Option<f64>) -> Option<String> {
    value.map(|v| format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Some(20.0)), Some("20.00".to_string()));
        assert_eq!(format_metric(Some(0.02)), Some("0.02".to_string()));
        assert_eq!(format_metric(None), None);
    }
}

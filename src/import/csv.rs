use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{ImportExportError, Result};
use crate::import::ImportFormat;
use crate::models::{RawRecord, RawValue};

/// CSV time-series importer with flexible column mapping.
///
/// Cells are kept as text; numeric coercion happens in the normalizer.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            "timestamp",
            &["timestamp", "time", "elapsed_time", "elapsed"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "heart_rate",
            &["heart_rate", "hr", "heartrate", "bpm"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "cadence",
            &["cadence", "rpm", "steps_per_minute", "spm"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance",
            &["distance", "dist", "total_distance", "cumulative_distance"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "speed",
            &["speed", "velocity", "speed_ms", "enhanced_speed"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "altitude",
            &["altitude", "elevation", "alt", "elev", "enhanced_altitude"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Read raw records from any CSV source with a header row
    pub fn records_from_reader<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let raw_headers = csv_reader
            .headers()
            .map_err(|e| ImportExportError::ParseError {
                format: "CSV".to_string(),
                reason: e.to_string(),
            })?
            .clone();
        let headers: Vec<String> = raw_headers
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();

        // Several columns may alias one field; enhanced_* columns are read
        // first, then the first non-empty cell per field wins.
        let mut column_order: Vec<usize> = (0..headers.len()).collect();
        column_order.sort_by_key(|&i| !is_enhanced_column(&raw_headers[i]));

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let mut record = RawRecord::with_capacity(headers.len());
            for &i in &column_order {
                let Some(cell) = row.get(i) else { continue };
                let name = &headers[i];
                if cell.is_empty() {
                    record.entry(name.clone()).or_insert(RawValue::Null);
                } else if matches!(record.get(name), None | Some(RawValue::Null)) {
                    record.insert(name.clone(), RawValue::Text(cell.to_string()));
                }
            }
            records.push(record);
        }

        Ok(records)
    }
}

fn is_enhanced_column(header: &str) -> bool {
    header.trim().to_lowercase().starts_with("enhanced")
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn read_records(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        let file = File::open(file_path)?;
        let records = self.records_from_reader(file)?;
        debug!(
            file = %file_path.display(),
            records = records.len(),
            "Read CSV time series"
        );
        Ok(records)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_aliases() {
        let importer = CsvImporter::new();
        assert_eq!(importer.normalize_column_name("HR"), "heart_rate");
        assert_eq!(importer.normalize_column_name("Heart Rate"), "heart_rate");
        assert_eq!(importer.normalize_column_name("enhanced_altitude"), "altitude");
        assert_eq!(importer.normalize_column_name("Power"), "power");
    }

    #[test]
    fn test_records_keep_cells_as_text() {
        let data = "time,hr,speed,notes\n0,140,2.9,start\n1,,3.0,\n2,abc,3.1,x\n";
        let records = CsvImporter::new().records_from_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["heart_rate"], RawValue::Text("140".into()));
        assert_eq!(records[1]["heart_rate"], RawValue::Null);
        assert_eq!(records[2]["heart_rate"], RawValue::Text("abc".into()));
        assert_eq!(records[2]["timestamp"], RawValue::Text("2".into()));
    }

    #[test]
    fn test_short_rows_are_accepted() {
        let data = "heart_rate,cadence\n150\n151,84\n";
        let records = CsvImporter::new().records_from_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert!(!records[0].contains_key("cadence"));
        assert_eq!(records[1]["cadence"], RawValue::Text("84".into()));
    }

    #[test]
    fn test_aliased_columns_keep_first_non_empty_cell() {
        let data = "speed,enhanced_speed,hr\n3.0,,150\n2.5,2.6,150\n,,151\n";
        let records = CsvImporter::new().records_from_reader(data.as_bytes()).unwrap();

        assert_eq!(records[0]["speed"], RawValue::Text("3.0".into()));
        assert_eq!(records[1]["speed"], RawValue::Text("2.6".into()));
        assert_eq!(records[2]["speed"], RawValue::Null);

        let series = crate::series::normalize(&records);
        assert_eq!(
            series.channel(crate::models::Channel::Speed),
            &[Some(3.0), Some(2.6), None][..]
        );
    }

    #[test]
    fn test_enhanced_column_wins_regardless_of_order() {
        let data = "Enhanced Altitude,altitude,time,timestamp\n101.5,101,,7\n";
        let records = CsvImporter::new().records_from_reader(data.as_bytes()).unwrap();

        assert_eq!(records[0]["altitude"], RawValue::Text("101.5".into()));
        assert_eq!(records[0]["timestamp"], RawValue::Text("7".into()));
    }

    #[test]
    fn test_can_import() {
        let importer = CsvImporter::new();
        assert!(importer.can_import(Path::new("series.CSV")));
        assert!(!importer.can_import(Path::new("series.fit")));
    }
}

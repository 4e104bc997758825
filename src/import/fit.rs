use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{FitError, Result};
use crate::import::ImportFormat;
use crate::models::{Channel, RawRecord, RawValue};

/// FIT file importer for Garmin native format.
///
/// Only `record` messages are read; each becomes one raw record carrying the
/// channel fields it holds.
pub struct FitImporter;

impl FitImporter {
    pub fn new() -> Self {
        Self
    }

    /// Decode a FIT payload into raw records
    pub fn records_from_bytes(bytes: &[u8]) -> Result<Vec<RawRecord>> {
        let messages = fitparser::from_bytes(bytes).map_err(|e| FitError::Corrupted {
            reason: e.to_string(),
        })?;
        Ok(extract_records(&messages))
    }

    /// Decode a FIT file into raw records
    pub fn read_records_from_file(file_path: &Path) -> Result<Vec<RawRecord>> {
        if !file_path.is_file() {
            return Err(FitError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let bytes = fs::read(file_path)?;
        let records = Self::records_from_bytes(&bytes)?;
        debug!(
            file = %file_path.display(),
            bytes = bytes.len(),
            records = records.len(),
            "Decoded FIT records"
        );
        Ok(records)
    }

    /// Heart rate and cadence summary of a FIT file
    pub fn summarize(file_path: &Path) -> Result<FitSummary> {
        let records = Self::read_records_from_file(file_path)?;
        if records.is_empty() {
            return Err(FitError::NoRecords {
                path: file_path.to_path_buf(),
            }
            .into());
        }
        Ok(FitSummary::from_records(&records))
    }

    /// Heart rate and cadence summary of an in-memory FIT payload
    pub fn summary_from_bytes(bytes: &[u8]) -> Result<FitSummary> {
        Ok(FitSummary::from_records(&Self::records_from_bytes(bytes)?))
    }
}

impl Default for FitImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for FitImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("fit"))
            .unwrap_or(false)
    }

    fn read_records(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        Self::read_records_from_file(file_path)
    }

    fn get_format_name(&self) -> &'static str {
        "FIT"
    }
}

/// Copy channel fields out of `record` messages.
///
/// `enhanced_speed` / `enhanced_altitude` win over their 16-bit
/// counterparts when a message carries both.
fn extract_records(messages: &[FitDataRecord]) -> Vec<RawRecord> {
    messages
        .iter()
        .filter(|message| message.kind() == MesgNum::Record)
        .filter_map(|message| {
            let mut record = RawRecord::new();
            for field in message.fields() {
                let value = RawValue::from(field.value());
                match field.name() {
                    "enhanced_speed" => {
                        record.insert(Channel::Speed.name().to_string(), value);
                    }
                    "enhanced_altitude" => {
                        record.insert(Channel::Altitude.name().to_string(), value);
                    }
                    name => {
                        if let Some(channel) = Channel::from_name(name) {
                            record.entry(channel.name().to_string()).or_insert(value);
                        }
                    }
                }
            }
            (!record.is_empty()).then_some(record)
        })
        .collect()
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Timestamp(ts) => RawValue::Timestamp(ts.with_timezone(&chrono::Utc)),
            Value::Byte(v) | Value::Enum(v) | Value::UInt8(v) | Value::UInt8z(v) => {
                RawValue::UInt(u64::from(*v))
            }
            Value::UInt16(v) | Value::UInt16z(v) => RawValue::UInt(u64::from(*v)),
            Value::UInt32(v) | Value::UInt32z(v) => RawValue::UInt(u64::from(*v)),
            Value::UInt64(v) | Value::UInt64z(v) => RawValue::UInt(*v),
            Value::SInt8(v) => RawValue::Int(i64::from(*v)),
            Value::SInt16(v) => RawValue::Int(i64::from(*v)),
            Value::SInt32(v) => RawValue::Int(i64::from(*v)),
            Value::SInt64(v) => RawValue::Int(*v),
            Value::Float32(v) => RawValue::Float(f64::from(*v)),
            Value::Float64(v) => RawValue::Float(*v),
            Value::String(s) => RawValue::Text(s.clone()),
            Value::Array(items) => RawValue::Array(items.iter().map(RawValue::from).collect()),
            #[allow(unreachable_patterns)]
            _ => RawValue::Null,
        }
    }
}

/// Quick heart rate / cadence figures used to enrich activity rows.
///
/// Samples are truncated to whole numbers before aggregation, the way device
/// summaries report them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitSummary {
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<i64>,
    pub avg_cadence: Option<f64>,
    pub max_cadence: Option<i64>,
}

impl FitSummary {
    pub fn from_records(records: &[RawRecord]) -> Self {
        let heart_rates = whole_samples(records, Channel::HeartRate);
        let cadences = whole_samples(records, Channel::Cadence);

        Self {
            avg_heart_rate: rounded_mean(&heart_rates),
            max_heart_rate: heart_rates.iter().copied().max(),
            avg_cadence: rounded_mean(&cadences),
            max_cadence: cadences.iter().copied().max(),
        }
    }
}

fn whole_samples(records: &[RawRecord], channel: Channel) -> Vec<i64> {
    records
        .iter()
        .filter_map(|record| record.get(channel.name()))
        .filter_map(|value| channel.coerce(value))
        .map(|v| v.trunc() as i64)
        .collect()
}

fn rounded_mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    crate::metrics::round2(mean)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sensor channels extracted from a workout recording, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Timestamp,
    HeartRate,
    Cadence,
    Distance,
    Speed,
    Altitude,
}

/// How a raw field value is turned into a number for a given channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionRule {
    /// Instants become Unix epoch seconds; plain numbers are taken as-is
    Instant,
    /// Numbers and numeric text; instants are rejected
    Numeric,
}

impl Channel {
    /// All channels in normalized column order
    pub const ALL: [Channel; 6] = [
        Channel::Timestamp,
        Channel::HeartRate,
        Channel::Cadence,
        Channel::Distance,
        Channel::Speed,
        Channel::Altitude,
    ];

    /// Field name used by recording devices and CSV headers
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Timestamp => "timestamp",
            Channel::HeartRate => "heart_rate",
            Channel::Cadence => "cadence",
            Channel::Distance => "distance",
            Channel::Speed => "speed",
            Channel::Altitude => "altitude",
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|channel| channel.name() == name)
    }

    /// Column position inside a normalized series
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn rule(&self) -> CoercionRule {
        match self {
            Channel::Timestamp => CoercionRule::Instant,
            _ => CoercionRule::Numeric,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded field value as delivered by a file decoder, before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<RawValue>),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<u64> for RawValue {
    fn from(value: u64) -> Self {
        RawValue::UInt(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(value: DateTime<Utc>) -> Self {
        RawValue::Timestamp(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    RawValue::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    RawValue::Int(i)
                } else {
                    n.as_f64().map_or(RawValue::Null, RawValue::Float)
                }
            }
            serde_json::Value::String(s) => RawValue::Text(s),
            serde_json::Value::Array(items) => {
                RawValue::Array(items.into_iter().map(RawValue::from).collect())
            }
            serde_json::Value::Object(_) => RawValue::Null,
        }
    }
}

/// One captured sample: field name to raw value, fields optional
pub type RawRecord = HashMap<String, RawValue>;

/// Columnar, equal-length time series over the fixed channel set.
///
/// Slot `i` of every channel refers to the same recorded instant. Built once
/// by [`crate::series::normalize`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSeries {
    columns: [Vec<Option<f64>>; 6],
}

impl NormalizedSeries {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            columns: std::array::from_fn(|_| Vec::with_capacity(rows)),
        }
    }

    /// Append one row; values are given in [`Channel::ALL`] order
    pub(crate) fn push_row(&mut self, row: [Option<f64>; 6]) {
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    pub fn channel(&self, channel: Channel) -> &[Option<f64>] {
        &self.columns[channel.index()]
    }

    /// Number of recorded rows
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `index` across all channels, in [`Channel::ALL`] order
    pub fn row(&self, index: usize) -> Option<[Option<f64>; 6]> {
        if index >= self.len() {
            return None;
        }
        Some(std::array::from_fn(|c| self.columns[c][index]))
    }

    pub fn rows(&self) -> impl Iterator<Item = [Option<f64>; 6]> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Count of non-missing slots in a channel
    pub fn present_count(&self, channel: Channel) -> usize {
        self.channel(channel).iter().filter(|v| v.is_some()).count()
    }
}

/// Scalar performance indicators derived from one activity.
///
/// `None` means the metric could not be computed from the input; it is never
/// replaced by zero. Present values are finite and rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean heart rate over all samples that carry one
    pub avg_hr: Option<f64>,

    /// Highest recorded heart rate
    pub max_hr: Option<f64>,

    /// Percentage change of mean heart rate from the first to the second half
    pub hr_drift_pct: Option<f64>,

    /// Mean speed (m/s) per mean heart rate (bpm)
    pub pace_hr_ratio: Option<f64>,

    /// 100 minus the cadence coefficient of variation, floored at 0
    pub cadence_consistency_pct: Option<f64>,

    /// Percentage loss of speed-per-beat efficiency in the second half
    pub aerobic_decoupling_pct: Option<f64>,
}

impl PerformanceMetrics {
    /// Metric names paired with their values, in report order
    pub fn fields(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("avg_hr", self.avg_hr),
            ("max_hr", self.max_hr),
            ("hr_drift_pct", self.hr_drift_pct),
            ("pace_hr_ratio", self.pace_hr_ratio),
            ("cadence_consistency_pct", self.cadence_consistency_pct),
            ("aerobic_decoupling_pct", self.aerobic_decoupling_pct),
        ]
    }

    pub fn is_all_undefined(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    pub fn defined_count(&self) -> usize {
        self.fields().iter().filter(|(_, value)| value.is_some()).count()
    }
}

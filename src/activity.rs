//! Activity metadata handling
//!
//! Provider activity listings are opaque JSON objects. This module selects
//! the recent activities of one type and flattens them into CSV-ready rows,
//! optionally enriched with a FIT summary. The metrics engine never sees
//! metadata.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::import::fit::FitSummary;

/// One activity as listed by the provider, keyed by provider field names
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityMetadata(pub Map<String, Value>);

impl ActivityMetadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Provider activity identifier, numeric or string
    pub fn activity_id(&self) -> Option<String> {
        match self.get("activityId")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// `activityType.typeKey`, or `activityType` when it is a plain string
    pub fn type_key(&self) -> Option<&str> {
        match self.get("activityType")? {
            Value::Object(obj) => obj.get("typeKey").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Local start time, read as UTC
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.get("startTimeLocal")?.as_str()?;
        parse_start_time(raw)
    }

    fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.trim().replacen(' ', "T", 1);
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .map(|naive| naive.and_utc())
}

/// Read a JSON array of activity objects
pub fn load_activities<P: AsRef<Path>>(path: P) -> Result<Vec<ActivityMetadata>> {
    let content = fs::read_to_string(path.as_ref())?;
    let activities: Vec<ActivityMetadata> = serde_json::from_str(&content)?;
    debug!(
        count = activities.len(),
        path = %path.as_ref().display(),
        "Loaded activity listing"
    );
    Ok(activities)
}

/// Lookback window plus activity type selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub days: i64,
    pub activity_type: String,
}

impl ActivityFilter {
    pub fn new(days: i64, activity_type: impl Into<String>) -> Self {
        Self {
            days,
            activity_type: activity_type.into(),
        }
    }

    /// Keep activities of the configured type that started within the window.
    ///
    /// A missing or unparseable start time counts as exactly the cutoff, so
    /// such activities are kept.
    pub fn apply(
        &self,
        activities: Vec<ActivityMetadata>,
        now: DateTime<Utc>,
    ) -> Vec<ActivityMetadata> {
        let cutoff = now - Duration::days(self.days);
        let total = activities.len();

        let kept: Vec<ActivityMetadata> = activities
            .into_iter()
            .filter(|activity| activity.type_key() == Some(self.activity_type.as_str()))
            .filter(|activity| activity.start_time().unwrap_or(cutoff) >= cutoff)
            .collect();

        debug!(
            total,
            kept = kept.len(),
            activity_type = %self.activity_type,
            days = self.days,
            "Filtered activities"
        );
        kept
    }
}

/// Flattened activity metadata as written to the activities CSV
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityRow {
    pub activity_id: Option<String>,
    pub activity_name: Option<String>,
    pub activity_type: Option<String>,
    pub start_time_local: Option<String>,
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
    pub moving_duration_s: Option<f64>,
    pub average_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub average_cadence: Option<f64>,
    pub calories: Option<f64>,
    pub fit_avg_heart_rate: Option<f64>,
    pub fit_max_heart_rate: Option<i64>,
    pub fit_avg_cadence: Option<f64>,
    pub fit_max_cadence: Option<i64>,
}

impl ActivityRow {
    pub fn from_metadata(activity: &ActivityMetadata) -> Self {
        Self {
            activity_id: activity.activity_id(),
            activity_name: activity.text("activityName"),
            activity_type: activity.type_key().map(str::to_string),
            start_time_local: activity.text("startTimeLocal"),
            distance_m: activity.number("distance"),
            duration_s: activity.number("duration"),
            moving_duration_s: activity.number("movingDuration"),
            average_hr: activity.number("averageHR"),
            max_hr: activity.number("maxHR"),
            average_cadence: activity.number("averageRunCadence"),
            calories: activity.number("calories"),
            ..Self::default()
        }
    }

    pub fn with_fit_summary(mut self, summary: &FitSummary) -> Self {
        self.fit_avg_heart_rate = summary.avg_heart_rate;
        self.fit_max_heart_rate = summary.max_heart_rate;
        self.fit_avg_cadence = summary.avg_cadence;
        self.fit_max_cadence = summary.max_cadence;
        self
    }
}

//! Series normalization
//!
//! Turns heterogeneous per-sample records into a [`NormalizedSeries`] with the
//! fixed channel set. Every record produces exactly one row; fields that are
//! absent or not numeric leave a missing slot in their channel.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::{Channel, CoercionRule, NormalizedSeries, RawRecord, RawValue};
use tracing::trace;

/// Build a normalized series from raw records, preserving record order
pub fn normalize(records: &[RawRecord]) -> NormalizedSeries {
    let mut series = NormalizedSeries::with_capacity(records.len());

    for record in records {
        let row = Channel::ALL.map(|channel| {
            record
                .get(channel.name())
                .and_then(|value| channel.coerce(value))
        });
        series.push_row(row);
    }

    trace!(
        rows = series.len(),
        heart_rate = series.present_count(Channel::HeartRate),
        speed = series.present_count(Channel::Speed),
        cadence = series.present_count(Channel::Cadence),
        "Normalized series"
    );

    series
}

impl Channel {
    /// Coerce a raw value into this channel's numeric domain.
    ///
    /// Returns `None` for anything that is not interpretable as a finite
    /// number. Fractional values are kept as-is.
    pub fn coerce(&self, value: &RawValue) -> Option<f64> {
        let number = match (self.rule(), value) {
            (_, RawValue::Null) => None,
            (_, RawValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            (_, RawValue::Int(i)) => Some(*i as f64),
            (_, RawValue::UInt(u)) => Some(*u as f64),
            (_, RawValue::Float(f)) => Some(*f),
            (CoercionRule::Instant, RawValue::Text(s)) => {
                let s = s.trim();
                s.parse::<f64>().ok().or_else(|| parse_instant(s).map(|ts| epoch_seconds(&ts)))
            }
            (_, RawValue::Text(s)) => s.trim().parse::<f64>().ok(),
            (CoercionRule::Instant, RawValue::Timestamp(ts)) => Some(epoch_seconds(ts)),
            (CoercionRule::Numeric, RawValue::Timestamp(_)) => None,
            (_, RawValue::Array(items)) => items.iter().find_map(|item| self.coerce(item)),
        };

        number.filter(|n| n.is_finite())
    }
}

fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1_000_000.0
}

/// RFC 3339, or a zone-less date and time read as UTC
fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

//! Performance metrics engine
//!
//! Computes six independent scalar indicators from a [`NormalizedSeries`].
//! Each metric drops missing values only from the channels it reads, and
//! every guard that would otherwise divide by zero or aggregate an empty set
//! yields `None` for that metric alone.
//!
//! Early/late comparisons use the halves split: after filtering, the ordered
//! values are cut at `len / 2` (floor) into `[0, mid)` and `[mid, len)`.
//!
//! Results are rounded to 2 decimals, half away from zero.

use crate::models::{Channel, NormalizedSeries, PerformanceMetrics};
use statrs::statistics::Statistics;
use tracing::trace;

/// Minimum surviving samples for any halves comparison
pub const MIN_HALVES_SAMPLES: usize = 4;

/// Minimum cadence samples for a sample standard deviation
pub const MIN_CADENCE_SAMPLES: usize = 2;

/// Compute all metrics for one activity
pub fn compute_metrics(series: &NormalizedSeries) -> PerformanceMetrics {
    if series.is_empty() {
        trace!("Empty series, all metrics undefined");
        return PerformanceMetrics::default();
    }

    let heart_rate = present(series.channel(Channel::HeartRate));
    let speed = present(series.channel(Channel::Speed));
    let cadence = present(series.channel(Channel::Cadence));

    let metrics = PerformanceMetrics {
        avg_hr: mean(&heart_rate).and_then(round2),
        max_hr: maximum(&heart_rate).and_then(round2),
        hr_drift_pct: hr_drift_pct(&heart_rate),
        pace_hr_ratio: pace_hr_ratio(&speed, &heart_rate),
        cadence_consistency_pct: cadence_consistency_pct(&cadence),
        aerobic_decoupling_pct: aerobic_decoupling_pct(
            series.channel(Channel::Speed),
            series.channel(Channel::HeartRate),
        ),
    };

    trace!(
        rows = series.len(),
        defined = metrics.defined_count(),
        "Computed performance metrics"
    );

    metrics
}

/// Percentage rise of mean heart rate from the first half to the second
pub fn hr_drift_pct(heart_rate: &[f64]) -> Option<f64> {
    let (first, second) = halves_means(heart_rate)?;
    if first == 0.0 {
        return None;
    }
    round2((second - first) / first * 100.0)
}

/// Mean speed per mean heart rate; the two channels are filtered independently
pub fn pace_hr_ratio(speed: &[f64], heart_rate: &[f64]) -> Option<f64> {
    let avg_speed = mean(speed)?;
    let avg_hr = mean(heart_rate)?;
    if avg_hr == 0.0 {
        return None;
    }
    round2(avg_speed / avg_hr)
}

/// `max(0, 100 - CV%)` using the sample standard deviation
pub fn cadence_consistency_pct(cadence: &[f64]) -> Option<f64> {
    if cadence.len() < MIN_CADENCE_SAMPLES {
        return None;
    }

    let avg = mean(cadence)?;
    let std_dev = cadence.iter().std_dev();
    if avg == 0.0 || !std_dev.is_finite() {
        return None;
    }

    round2((100.0 - std_dev / avg * 100.0).max(0.0))
}

/// Percentage drop in speed-per-beat efficiency from the first half to the second.
///
/// Only rows carrying both speed and a non-zero heart rate take part; a zero
/// heart rate is treated as jointly missing rather than divided by.
pub fn aerobic_decoupling_pct(speed: &[Option<f64>], heart_rate: &[Option<f64>]) -> Option<f64> {
    let efficiency: Vec<f64> = speed
        .iter()
        .zip(heart_rate)
        .filter_map(|pair| match pair {
            (Some(s), Some(hr)) if *hr != 0.0 => Some(s / hr),
            _ => None,
        })
        .collect();

    let (first_eff, second_eff) = halves_means(&efficiency)?;
    if first_eff == 0.0 {
        return None;
    }
    round2((first_eff - second_eff) / first_eff * 100.0)
}

/// Round to 2 decimals; non-finite input is undefined
pub fn round2(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        // Beyond 2-decimal resolution already
        return Some(value);
    }
    // + 0.0 folds -0.0 into 0.0
    Some(scaled.round() / 100.0 + 0.0)
}

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean()).filter(|m| m.is_finite())
}

fn maximum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Split at the floor midpoint; `None` below [`MIN_HALVES_SAMPLES`]
fn split_halves(values: &[f64]) -> Option<(&[f64], &[f64])> {
    if values.len() < MIN_HALVES_SAMPLES {
        return None;
    }
    Some(values.split_at(values.len() / 2))
}

fn halves_means(values: &[f64]) -> Option<(f64, f64)> {
    let (first, second) = split_halves(values)?;
    Some((mean(first)?, mean(second)?))
}

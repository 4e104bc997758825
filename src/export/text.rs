use std::fmt;
use std::path::Path;

use super::format_metric;
use crate::error::Result;
use crate::models::PerformanceMetrics;

const LABELS: [&str; 6] = [
    "Avg HR (bpm)",
    "Max HR (bpm)",
    "HR Drift (%)",
    "Pace / HR Ratio",
    "Cadence Consistency (%)",
    "Aerobic Decoupling (%)",
];

/// Text summary of one activity's metrics; undefined metrics print as `n/a`
pub struct MetricsSummary<'a>(pub &'a PerformanceMetrics);

impl fmt::Display for MetricsSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PERFORMANCE METRICS")?;
        writeln!(f, "{:-<36}", "")?;
        for (label, (_, value)) in LABELS.iter().zip(self.0.fields()) {
            let shown = format_metric(value).unwrap_or_else(|| "n/a".to_string());
            writeln!(f, "{:<26}{:>10}", label, shown)?;
        }
        Ok(())
    }
}

/// Human-readable multi-line summary
pub fn render_metrics(metrics: &PerformanceMetrics) -> String {
    MetricsSummary(metrics).to_string()
}

/// Write the text summary to a file
pub fn write_metrics_report<P: AsRef<Path>>(metrics: &PerformanceMetrics, output_path: P) -> Result<()> {
    std::fs::write(output_path, render_metrics(metrics))?;
    Ok(())
}

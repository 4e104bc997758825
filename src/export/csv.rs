use csv::Writer;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::format_metric;
use crate::activity::ActivityRow;
use crate::error::{ImportExportError, Result};
use crate::import::MetricsReport;
use crate::models::{Channel, NormalizedSeries, PerformanceMetrics};

fn prepare_output(output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ImportExportError::ExportFailed {
                path: output_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
    }
    Ok(())
}

/// Export flattened activity rows; no rows gives an empty file
pub fn save_activities<P: AsRef<Path>>(rows: &[ActivityRow], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    prepare_output(output_path)?;

    if rows.is_empty() {
        fs::write(output_path, "")?;
        info!("No activities to save, wrote empty {}", output_path.display());
        return Ok(());
    }

    let mut writer = Writer::from_path(output_path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Saved {} activities to {}", rows.len(), output_path.display());
    Ok(())
}

/// Export a normalized series, one line per sample; missing slots are empty cells
pub fn save_timeseries<P: AsRef<Path>>(series: &NormalizedSeries, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    prepare_output(output_path)?;

    let mut writer = Writer::from_path(output_path)?;
    writer.write_record(Channel::ALL.iter().map(Channel::name))?;

    for row in series.rows() {
        writer.write_record(row.iter().map(|slot| slot.map(|v| v.to_string()).unwrap_or_default()))?;
    }
    writer.flush()?;

    info!("Saved {} samples to {}", series.len(), output_path.display());
    Ok(())
}

/// Export one metrics line per analyzed activity; undefined metrics are empty cells
pub fn save_metrics<P: AsRef<Path>>(reports: &[&MetricsReport], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    prepare_output(output_path)?;

    write_metrics(reports, fs::File::create(output_path)?)?;

    info!("Saved metrics for {} activities to {}", reports.len(), output_path.display());
    Ok(())
}

/// Write the metrics table to any sink
pub fn write_metrics<W: Write>(reports: &[&MetricsReport], sink: W) -> Result<()> {
    let mut writer = Writer::from_writer(sink);

    let mut header = vec!["source", "samples"];
    header.extend(PerformanceMetrics::default().fields().iter().map(|(name, _)| *name));
    writer.write_record(&header)?;

    for report in reports {
        let mut record = vec![report.source.clone(), report.samples.to_string()];
        record.extend(
            report
                .metrics
                .fields()
                .iter()
                .map(|(_, value)| format_metric(*value).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawRecord, RawValue};
    use crate::series::normalize;
    use tempfile::tempdir;

    #[test]
    fn test_save_activities_empty_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("activities.csv");

        save_activities(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_save_activities_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activities.csv");
        let rows = vec![ActivityRow {
            activity_id: Some("42".to_string()),
            activity_name: Some("Tempo, hills".to_string()),
            average_hr: Some(151.0),
            fit_max_heart_rate: Some(178),
            ..ActivityRow::default()
        }];

        save_activities(&rows, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("activity_id,activity_name,activity_type"));
        let line = lines.next().unwrap();
        assert!(line.starts_with("42,\"Tempo, hills\","));
        assert!(line.contains(",151.0,"));
        assert!(line.contains(",178,"));
    }

    #[test]
    fn test_save_timeseries_writes_empty_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");

        let records: Vec<RawRecord> = vec![
            [("timestamp", RawValue::UInt(0)), ("heart_rate", RawValue::UInt(140))]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            [("timestamp", RawValue::UInt(1)), ("speed", RawValue::Float(3.25))]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ];
        save_timeseries(&normalize(&records), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,heart_rate,cadence,distance,speed,altitude");
        assert_eq!(lines[1], "0,140,,,,");
        assert_eq!(lines[2], "1,,,,3.25,");
    }

    #[test]
    fn test_save_metrics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let report = MetricsReport {
            source: "run.fit".to_string(),
            samples: 4,
            metrics: PerformanceMetrics {
                avg_hr: Some(110.0),
                hr_drift_pct: Some(20.0),
                ..PerformanceMetrics::default()
            },
        };

        save_metrics(&[&report], &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "source,samples,avg_hr,max_hr,hr_drift_pct,pace_hr_ratio,cadence_consistency_pct,aerobic_decoupling_pct"
        );
        assert_eq!(lines[1], "run.fit,4,110.00,,20.00,,,");
    }

    #[test]
    fn test_write_metrics_to_buffer() {
        let report = MetricsReport {
            source: "steady.csv".to_string(),
            samples: 0,
            metrics: PerformanceMetrics::default(),
        };

        let mut buffer = Vec::new();
        write_metrics(&[&report], &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("source,samples,avg_hr"));
        assert_eq!(lines[1], "steady.csv,0,,,,,,");
    }
}

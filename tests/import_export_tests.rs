use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::tempdir;

use runstack::activity::{load_activities, ActivityFilter, ActivityRow};
use runstack::export;
use runstack::import::batch::{BatchAnalyzer, BatchConfig};
use runstack::import::fit::FitSummary;
use runstack::{ImportManager, MetricsReport, RunStackError};

/// File-level workflows: import, analyze and export

const STEADY_RUN_CSV: &str = "\
Time,HR,Cadence,Speed,Elevation
0,150,170,3.0,12.5
1,150,170,3.0,12.7
2,150,170,2.0,12.9
3,150,170,2.0,13.0
";

#[test]
fn test_analyze_csv_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("steady.csv");
    fs::write(&path, STEADY_RUN_CSV).unwrap();

    let analysis = ImportManager::new().analyze_file(&path).unwrap();
    assert_eq!(analysis.series.len(), 4);
    assert_eq!(analysis.metrics.avg_hr, Some(150.0));
    assert_eq!(analysis.metrics.cadence_consistency_pct, Some(100.0));
    assert_eq!(analysis.metrics.aerobic_decoupling_pct, Some(33.33));

    let series_path = dir.path().join("out").join("series.csv");
    export::csv::save_timeseries(&analysis.series, &series_path).unwrap();
    let content = fs::read_to_string(&series_path).unwrap();
    assert_eq!(content.lines().count(), 5);
    assert!(content.lines().nth(1).unwrap().starts_with("0,150,170,,3,12.5"));

    let report = MetricsReport::from(&analysis);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["samples"], 4);
    assert_eq!(json["pace_hr_ratio"], serde_json::json!(0.02));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();

    let err = ImportManager::new().analyze_file(&path).unwrap_err();
    assert!(matches!(err, RunStackError::ImportExport(_)));
}

#[test]
fn test_batch_directory_keeps_going_past_failures() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_steady.csv"), STEADY_RUN_CSV).unwrap();
    fs::write(dir.path().join("b_broken.fit"), b"not a fit file").unwrap();
    fs::write(dir.path().join("c_empty.csv"), "heart_rate\n").unwrap();
    fs::write(dir.path().join("readme.md"), "ignored").unwrap();

    let analyzer = BatchAnalyzer::with_config(BatchConfig {
        num_threads: Some(2),
        show_progress: false,
    });
    let summary = analyzer.analyze_directory(dir.path()).unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.successful_files, 2);
    assert_eq!(summary.failed_files, 1);
    assert!(summary.results[0].file_path.ends_with("a_steady.csv"));
    assert!(summary.results[1].error.is_some());

    let empty = summary.results[2].report.as_ref().unwrap();
    assert_eq!(empty.samples, 0);
    assert!(empty.metrics.is_all_undefined());

    let out = dir.path().join("metrics.csv");
    export::csv::save_metrics(&summary.reports(), &out).unwrap();
    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains("150.00,150.00,0.00,0.02,100.00,33.33"));
}

#[test]
fn test_activity_listing_to_csv() {
    let dir = tempdir().unwrap();
    let listing = dir.path().join("activities.json");
    fs::write(
        &listing,
        r#"[
            {"activityId": 101, "activityName": "Easy run", "activityType": {"typeKey": "running"},
             "startTimeLocal": "2024-03-14 07:30:00", "distance": 8012.5, "duration": 2900.1,
             "averageHR": 142.0, "maxHR": 160.0, "averageRunCadence": 168.2},
            {"activityId": 102, "activityType": {"typeKey": "cycling"},
             "startTimeLocal": "2024-03-13 18:00:00"},
            {"activityId": 103, "activityType": {"typeKey": "running"},
             "startTimeLocal": "2023-12-01 07:00:00"},
            {"activityId": 104, "activityType": {"typeKey": "running"},
             "startTimeLocal": "yesterday"}
        ]"#,
    )
    .unwrap();

    let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let activities = load_activities(&listing).unwrap();
    let kept = ActivityFilter::new(14, "running").apply(activities, now);
    let ids: Vec<_> = kept.iter().filter_map(|a| a.activity_id()).collect();
    assert_eq!(ids, vec!["101".to_string(), "104".to_string()]);

    let summary = FitSummary {
        avg_heart_rate: Some(141.37),
        max_heart_rate: Some(161),
        avg_cadence: Some(84.1),
        max_cadence: Some(90),
    };
    let rows: Vec<ActivityRow> = kept
        .iter()
        .map(ActivityRow::from_metadata)
        .enumerate()
        .map(|(i, row)| if i == 0 { row.with_fit_summary(&summary) } else { row })
        .collect();

    let out = dir.path().join("data").join("activities.csv");
    export::csv::save_activities(&rows, &out).unwrap();
    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("101,Easy run,running,2024-03-14 07:30:00,8012.5"));
    assert!(lines[1].ends_with("141.37,161,84.1,90"));
    assert!(lines[2].starts_with("104,,running,yesterday"));
}

#[test]
fn test_missing_listing_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_activities(dir.path().join("missing.json")).is_err());
}

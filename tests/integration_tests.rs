use runstack::{compute_metrics, normalize, Channel, PerformanceMetrics, RawRecord, RawValue};

/// End-to-end tests: raw records through the normalizer into the metrics engine

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn record(fields: &[(&str, RawValue)]) -> RawRecord {
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn running_records(samples: &[(f64, f64, f64)]) -> Vec<RawRecord> {
        samples
            .iter()
            .enumerate()
            .map(|(i, &(speed, hr, cadence))| {
                record(&[
                    ("timestamp", RawValue::UInt(i as u64)),
                    ("speed", RawValue::Float(speed)),
                    ("heart_rate", RawValue::Float(hr)),
                    ("cadence", RawValue::Float(cadence)),
                    ("distance", RawValue::Float(speed * i as f64)),
                ])
            })
            .collect()
    }

    #[test]
    fn test_empty_input_gives_all_undefined() {
        let series = normalize(&[]);
        assert!(series.is_empty());

        let metrics = compute_metrics(&series);
        assert_eq!(metrics, PerformanceMetrics::default());
        assert!(metrics.is_all_undefined());
    }

    #[test]
    fn test_full_running_activity() {
        let records = running_records(&[
            (3.0, 150.0, 170.0),
            (3.0, 150.0, 170.0),
            (2.0, 150.0, 170.0),
            (2.0, 150.0, 170.0),
        ]);

        let metrics = compute_metrics(&normalize(&records));
        assert_eq!(metrics.avg_hr, Some(150.0));
        assert_eq!(metrics.max_hr, Some(150.0));
        assert_eq!(metrics.hr_drift_pct, Some(0.0));
        assert_eq!(metrics.pace_hr_ratio, Some(0.02));
        assert_eq!(metrics.cadence_consistency_pct, Some(100.0));
        assert_eq!(metrics.aerobic_decoupling_pct, Some(33.33));
        assert_eq!(metrics.defined_count(), 6);
    }

    #[test]
    fn test_hr_drift_from_raw_records() {
        let records: Vec<RawRecord> = [100, 100, 120, 120]
            .iter()
            .map(|&hr| record(&[("heart_rate", RawValue::Int(hr))]))
            .collect();

        let metrics = compute_metrics(&normalize(&records));
        assert_eq!(metrics.hr_drift_pct, Some(20.0));
        assert_eq!(metrics.avg_hr, Some(110.0));
        assert_eq!(metrics.max_hr, Some(120.0));
    }

    #[test]
    fn test_hr_drift_needs_four_samples() {
        let records: Vec<RawRecord> = [100, 110, 120]
            .iter()
            .map(|&hr| record(&[("heart_rate", RawValue::Int(hr))]))
            .collect();

        let metrics = compute_metrics(&normalize(&records));
        assert_eq!(metrics.hr_drift_pct, None);
        assert_eq!(metrics.avg_hr, Some(110.0));
    }

    #[test]
    fn test_missing_heart_rate_leaves_other_metrics_alone() {
        let records: Vec<RawRecord> = [80.0, 80.0, 80.0, 80.0]
            .iter()
            .map(|&cadence| {
                record(&[
                    ("cadence", RawValue::Float(cadence)),
                    ("speed", RawValue::Float(3.1)),
                    ("heart_rate", RawValue::Null),
                ])
            })
            .collect();

        let metrics = compute_metrics(&normalize(&records));
        assert_eq!(metrics.avg_hr, None);
        assert_eq!(metrics.max_hr, None);
        assert_eq!(metrics.hr_drift_pct, None);
        assert_eq!(metrics.pace_hr_ratio, None);
        assert_eq!(metrics.aerobic_decoupling_pct, None);
        assert_eq!(metrics.cadence_consistency_pct, Some(100.0));
    }

    #[test]
    fn test_cadence_consistency_clamps_at_zero() {
        let records: Vec<RawRecord> = [1.0, 100.0, 1.0, 1.0]
            .iter()
            .map(|&cadence| record(&[("cadence", RawValue::Float(cadence))]))
            .collect();

        let metrics = compute_metrics(&normalize(&records));
        assert_eq!(metrics.cadence_consistency_pct, Some(0.0));
    }

    #[test]
    fn test_pace_hr_ratio_filters_channels_independently() {
        let records = vec![
            record(&[("speed", RawValue::Float(2.5)), ("heart_rate", RawValue::Int(150))]),
            record(&[("speed", RawValue::Float(3.0))]),
            record(&[("speed", RawValue::Float(3.5)), ("heart_rate", RawValue::Int(150))]),
            record(&[("heart_rate", RawValue::Int(150))]),
        ];

        let metrics = compute_metrics(&normalize(&records));
        assert_eq!(metrics.pace_hr_ratio, Some(0.02));
        // only two joint rows survive
        assert_eq!(metrics.aerobic_decoupling_pct, None);
    }

    #[test]
    fn test_unparseable_values_keep_rows() {
        let records = vec![
            record(&[("heart_rate", RawValue::Text("140".into()))]),
            record(&[("heart_rate", RawValue::Text("--".into()))]),
            record(&[("heart_rate", RawValue::Array(vec![]))]),
            record(&[("heart_rate", RawValue::Float(f64::NAN))]),
            record(&[("heart_rate", RawValue::UInt(150)), ("power", RawValue::UInt(250))]),
        ];

        let series = normalize(&records);
        assert_eq!(series.len(), records.len());
        for channel in Channel::ALL {
            assert_eq!(series.channel(channel).len(), records.len());
        }
        assert_eq!(
            series.channel(Channel::HeartRate),
            &[Some(140.0), None, None, None, Some(150.0)][..]
        );
        assert_eq!(series.present_count(Channel::HeartRate), 2);
        assert_eq!(series.present_count(Channel::Speed), 0);

        let metrics = compute_metrics(&series);
        assert_eq!(metrics.avg_hr, Some(145.0));
    }

    #[test]
    fn test_compute_metrics_is_idempotent() {
        let records = running_records(&[
            (3.2, 141.0, 168.0),
            (3.1, 144.0, 171.0),
            (3.0, 149.0, 169.0),
            (2.9, 153.0, 166.0),
            (2.9, 155.0, 172.0),
        ]);
        let series = normalize(&records);

        let first = compute_metrics(&series);
        let second = compute_metrics(&series);
        assert_eq!(first, second);
        assert_eq!(series, normalize(&records));
    }

    #[test]
    fn test_metrics_serialize_with_nulls() {
        let records: Vec<RawRecord> = [100, 100, 120, 120]
            .iter()
            .map(|&hr| record(&[("heart_rate", RawValue::Int(hr))]))
            .collect();

        let metrics = compute_metrics(&normalize(&records));
        let json = serde_json::to_value(metrics).unwrap();
        assert_eq!(json["hr_drift_pct"], serde_json::json!(20.0));
        assert!(json["pace_hr_ratio"].is_null());
        assert!(json["aerobic_decoupling_pct"].is_null());
    }
}

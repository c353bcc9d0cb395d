use chrono::{DateTime, FixedOffset, TimeDelta};
use indexmap::IndexMap;
use log::debug;

use super::record::{total_nanos, JobRecord};
use crate::error::Result;
use crate::providers::circleci::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    start_time: DateTime<FixedOffset>,
    value: f64,
}

/// A chronological per-name sequence, smoothed when it is longer than the window.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    /// Number of job results the series was built from.
    pub samples: usize,
    pub points: Vec<f64>,
}

/// Duration in seconds of every successful job, per name.
///
/// Failed jobs are left out since they often stop early and would skew the trend.
pub fn duration_series(records: &[JobRecord], window: usize) -> Result<Vec<TimeSeries>> {
    let samples = collect_samples(
        records.iter().filter(|r| r.status == JobStatus::Success),
        |record| Ok(seconds(record.duration()?)),
    )?;
    Ok(build_series(samples, window))
}

/// Outcome of every countable job per name: `1.0` for success, `0.0` for failure.
pub fn success_series(records: &[JobRecord], window: usize) -> Result<Vec<TimeSeries>> {
    let samples = collect_samples(
        records.iter().filter(|r| r.status.is_countable()),
        |record| Ok(if record.status == JobStatus::Success { 1.0 } else { 0.0 }),
    )?;
    Ok(build_series(samples, window))
}

#[allow(clippy::cast_precision_loss)]
fn seconds(duration: TimeDelta) -> f64 {
    total_nanos(duration) as f64 / 1e9
}

fn collect_samples<'a>(
    records: impl Iterator<Item = &'a JobRecord>,
    value_of: impl Fn(&JobRecord) -> Result<f64>,
) -> Result<IndexMap<String, Vec<Sample>>> {
    let mut grouped: IndexMap<String, Vec<Sample>> = IndexMap::new();
    for record in records {
        let sample = Sample {
            start_time: record.started_at()?,
            value: value_of(record)?,
        };
        grouped.entry(record.name.clone()).or_default().push(sample);
    }
    Ok(grouped)
}

fn build_series(grouped: IndexMap<String, Vec<Sample>>, window: usize) -> Vec<TimeSeries> {
    grouped
        .into_iter()
        .map(|(name, mut samples)| {
            samples.sort_by_key(|s| s.start_time);
            let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
            let points = if window > 0 && values.len() > window {
                moving_average(&values, window)
            } else {
                values
            };
            TimeSeries {
                name,
                samples: samples.len(),
                points,
            }
        })
        .collect()
}

/// Trailing simple moving average: `output[i] = mean(source[i..i + window])`.
///
/// The output has `source.len() - (window - 1)` points.
///
/// # Panics
///
/// Panics if `window` is zero or `source` is shorter than `window`; callers
/// check the length first.
pub fn moving_average(source: &[f64], window: usize) -> Vec<f64> {
    assert!(window > 0, "moving average window must be positive");
    assert!(
        source.len() >= window,
        "moving average needs at least {window} points, got {}",
        source.len()
    );

    debug!("Moving average size: {}", source.len() - (window - 1));
    #[allow(clippy::cast_precision_loss)]
    let divisor = window as f64;
    source
        .windows(window)
        .enumerate()
        .map(|(i, values)| {
            let average = values.iter().sum::<f64>() / divisor;
            debug!("Average from {i} to {}: {average}", i + window);
            average
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::analysis::record::test_support::record;

    mod moving_average {
        use super::*;

        #[test]
        fn averages_each_trailing_window() {
            assert_eq!(
                moving_average(&[10.0, 20.0, 30.0, 40.0], 2),
                vec![15.0, 25.0, 35.0]
            );
        }

        #[test]
        fn window_equal_to_length_yields_single_point() {
            assert_eq!(moving_average(&[1.0, 2.0, 3.0], 3), vec![2.0]);
        }

        #[test]
        fn window_of_one_is_identity() {
            assert_eq!(moving_average(&[4.0, 8.0], 1), vec![4.0, 8.0]);
        }

        #[test]
        #[should_panic(expected = "at least 5 points")]
        fn panics_when_shorter_than_window() {
            moving_average(&[1.0, 2.0], 5);
        }
    }

    #[test]
    fn test_duration_series_is_chronological_and_success_only() {
        let records = vec![
            record("build", JobStatus::Success, "2020-01-03T00:00:00Z", 30),
            record("build", JobStatus::Failed, "2020-01-02T00:00:00Z", 99),
            record("build", JobStatus::Success, "2020-01-01T00:00:00Z", 10),
            record("lint", JobStatus::Success, "2020-01-01T00:00:00Z", 5),
        ];

        let series = duration_series(&records, 10).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "build");
        assert_eq!(series[0].points, vec![10.0, 30.0]);
        assert_eq!(series[0].samples, 2);
        assert_eq!(series[1].points, vec![5.0]);
    }

    #[test]
    fn test_success_series_maps_outcomes() {
        let records = vec![
            record("build", JobStatus::Failed, "2020-01-02T00:00:00Z", 1),
            record("build", JobStatus::Success, "2020-01-01T00:00:00Z", 1),
            record("build", JobStatus::Canceled, "2020-01-03T00:00:00Z", 1),
        ];

        let series = success_series(&records, 10).unwrap();

        assert_eq!(series[0].points, vec![1.0, 0.0]);
    }

    #[test]
    fn test_series_longer_than_window_is_smoothed() {
        let records: Vec<JobRecord> = (0..12)
            .map(|i| {
                let start = format!("2020-01-01T00:{i:02}:00Z");
                record("build", JobStatus::Success, &start, i64::from(i))
            })
            .collect();

        let series = duration_series(&records, 10).unwrap();

        // 0..=9 averages 4.5, then 5.5, 6.5
        assert_eq!(series[0].points, vec![4.5, 5.5, 6.5]);
        assert_eq!(series[0].samples, 12);
    }

    #[test]
    fn test_series_equal_to_window_is_not_smoothed() {
        let records: Vec<JobRecord> = (0..3)
            .map(|i| {
                let start = format!("2020-01-01T00:{i:02}:00Z");
                record("build", JobStatus::Success, &start, 1)
            })
            .collect();

        let series = duration_series(&records, 3).unwrap();

        assert_eq!(series[0].points.len(), 3);
    }

    #[test]
    fn test_sub_second_durations_are_fractional() {
        let mut quick = record("build", JobStatus::Success, "2020-01-01T00:00:00Z", 0);
        quick.end_time = Some(parse("2020-01-01T00:00:01.25Z"));

        let series = duration_series(&[quick], 10).unwrap();

        assert_eq!(series[0].points, vec![1.25]);
    }

    fn parse(value: &str) -> DateTime<FixedOffset> {
        crate::analysis::record::parse_time(value).unwrap()
    }
}

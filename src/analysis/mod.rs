mod aggregate;
mod filter;
mod input;
mod ranking;
mod record;
mod series;

pub use aggregate::{aggregate, AggregateEntry};
pub use filter::FilterCriteria;
pub use input::{discover_input_files, load_records};
pub use ranking::{rank_by_duration, rank_by_success_rate};
pub use record::JobRecord;
pub use series::{duration_series, success_series, TimeSeries};

use chrono::Utc;
use log::info;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::insights::{AnalysisReport, JobDuration, JobSuccessRate, SeriesReport};

/// Runs the analysis pipeline: filter, aggregate, rank and build trend series.
///
/// Only the sections enabled in `config` are computed.
///
/// # Errors
///
/// Fails if a countable job result has no start or stop time.
pub fn analyze(
    mut records: Vec<JobRecord>,
    criteria: &FilterCriteria,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    let total_records = records.len();
    info!("Number of job results: {total_records}");

    criteria.apply(&mut records);

    let entries = aggregate(&records)?;
    info!("Aggregated {} distinct jobs", entries.len());

    let durations = if config.print_duration {
        rank_by_duration(entries.values())
            .into_iter()
            .map(job_duration)
            .collect()
    } else {
        Vec::new()
    };

    let success_rates = if config.print_success_rate {
        rank_by_success_rate(entries.values())
            .into_iter()
            .map(job_success_rate)
            .collect()
    } else {
        Vec::new()
    };

    let duration_series = if config.print_duration_graph {
        to_reports(duration_series(&records, config.window)?)
    } else {
        Vec::new()
    };

    let success_series = if config.print_success_graph {
        to_reports(success_series(&records, config.window)?)
    } else {
        Vec::new()
    };

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        total_records,
        filtered_records: records.len(),
        durations,
        success_rates,
        duration_series,
        success_series,
    })
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn job_duration(entry: &AggregateEntry) -> JobDuration {
    let average = entry.average_nanos();
    JobDuration {
        name: entry.name.clone(),
        average_seconds: average as f64 / 1e9,
        rounded_seconds: round_to_seconds(average) as i64,
        frequency: entry.frequency,
    }
}

fn job_success_rate(entry: &AggregateEntry) -> JobSuccessRate {
    JobSuccessRate {
        name: entry.name.clone(),
        success_count: entry.success_count,
        total_count: entry.total(),
        success_percent: entry.success_percent(),
    }
}

fn to_reports(series: Vec<TimeSeries>) -> Vec<SeriesReport> {
    series
        .into_iter()
        .map(|s| SeriesReport {
            name: s.name,
            samples: s.samples,
            points: s.points,
        })
        .collect()
}

/// Rounds nanoseconds to whole seconds, halves away from zero.
fn round_to_seconds(nanos: i128) -> i128 {
    const HALF: i128 = 500_000_000;
    const SECOND: i128 = 1_000_000_000;
    if nanos < 0 {
        (nanos - HALF) / SECOND
    } else {
        (nanos + HALF) / SECOND
    }
}

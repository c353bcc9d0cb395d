use chrono::TimeDelta;
use indexmap::IndexMap;

use super::record::{total_nanos, JobRecord};
use crate::error::Result;
use crate::providers::circleci::JobStatus;

/// Per-name rollup of countable (`success` or `failed`) job results.
///
/// Invariant: `frequency == success_count + failure_count`, and `frequency > 0`
/// because entries are only created for a countable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateEntry {
    pub name: String,
    pub frequency: u64,
    pub cumulative_duration: TimeDelta,
    pub success_count: u64,
    pub failure_count: u64,
}

impl AggregateEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frequency: 0,
            cumulative_duration: TimeDelta::zero(),
            success_count: 0,
            failure_count: 0,
        }
    }

    /// Truncating average duration in nanoseconds.
    pub fn average_nanos(&self) -> i128 {
        total_nanos(self.cumulative_duration) / i128::from(self.frequency.max(1))
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Success rate as an integer percentage, truncated. Zero when nothing was counted.
    pub fn success_percent(&self) -> u64 {
        match self.total() {
            0 => 0,
            total => (100 * self.success_count) / total,
        }
    }
}

/// Groups countable records by name.
///
/// Entries are returned in first-encounter order. Records whose status is
/// neither `success` nor `failed` are skipped.
///
/// # Errors
///
/// Returns an error if a countable record lacks a start or stop time.
pub fn aggregate(records: &[JobRecord]) -> Result<IndexMap<String, AggregateEntry>> {
    let mut entries: IndexMap<String, AggregateEntry> = IndexMap::new();

    for record in records.iter().filter(|r| r.status.is_countable()) {
        let duration = record.duration()?;
        let entry = entries
            .entry(record.name.clone())
            .or_insert_with(|| AggregateEntry::new(&record.name));

        entry.frequency += 1;
        entry.cumulative_duration += duration;
        match record.status {
            JobStatus::Success => entry.success_count += 1,
            JobStatus::Failed => entry.failure_count += 1,
            other => unreachable!("status {other} passed the countable-status filter"),
        }
    }

    Ok(entries)
}

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::error::{CIToolError, Result};
use crate::providers::circleci::{JobStatus, RawJobResult};

/// One job result, parsed and validated. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub build_num: u64,
    pub status: JobStatus,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
}

impl JobRecord {
    /// Wall-clock duration of the job.
    ///
    /// # Errors
    ///
    /// Returns [`CIToolError::MissingTimestamp`] if either timestamp is absent.
    pub fn duration(&self) -> Result<TimeDelta> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Ok(end - start),
            _ => Err(self.missing_timestamp()),
        }
    }

    /// Start time, required for any chronological ordering.
    pub fn started_at(&self) -> Result<DateTime<FixedOffset>> {
        self.start_time.ok_or_else(|| self.missing_timestamp())
    }

    fn missing_timestamp(&self) -> CIToolError {
        CIToolError::MissingTimestamp {
            build_num: self.build_num,
            name: self.name.clone(),
        }
    }
}

impl TryFrom<RawJobResult> for JobRecord {
    type Error = CIToolError;

    fn try_from(raw: RawJobResult) -> Result<Self> {
        Ok(Self {
            start_time: raw.start_time.as_deref().map(parse_time).transpose()?,
            end_time: raw.stop_time.as_deref().map(parse_time).transpose()?,
            name: raw.workflows.job_name,
            owner: raw.username,
            repo: raw.reponame,
            branch: raw.branch,
            build_num: raw.build_num,
            status: raw.status,
        })
    }
}

/// Parses an RFC 3339 timestamp with up to nanosecond precision.
pub fn parse_time(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|source| CIToolError::InvalidTimestamp {
        value: value.to_string(),
        source,
    })
}

/// Total nanoseconds in `delta`, without the `i64` overflow of `num_nanoseconds`.
pub fn total_nanos(delta: TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * 1_000_000_000 + i128::from(delta.subsec_nanos())
}

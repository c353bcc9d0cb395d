use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CIToolError;

/// Final status of a CircleCI job, as reported in the `status` field of a build result.
///
/// Only [`JobStatus::Success`] and [`JobStatus::Failed`] take part in statistics;
/// every other status is excluded without being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Retried,
    Canceled,
    InfrastructureFail,
    Timedout,
    NotRun,
    Running,
    Failed,
    Queued,
    Scheduled,
    NotRunning,
    NoTests,
    Fixed,
    Success,
}

impl JobStatus {
    pub const ALL: [JobStatus; 13] = [
        JobStatus::Retried,
        JobStatus::Canceled,
        JobStatus::InfrastructureFail,
        JobStatus::Timedout,
        JobStatus::NotRun,
        JobStatus::Running,
        JobStatus::Failed,
        JobStatus::Queued,
        JobStatus::Scheduled,
        JobStatus::NotRunning,
        JobStatus::NoTests,
        JobStatus::Fixed,
        JobStatus::Success,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Retried => "retried",
            JobStatus::Canceled => "canceled",
            JobStatus::InfrastructureFail => "infrastructure_fail",
            JobStatus::Timedout => "timedout",
            JobStatus::NotRun => "not_run",
            JobStatus::Running => "running",
            JobStatus::Failed => "failed",
            JobStatus::Queued => "queued",
            JobStatus::Scheduled => "scheduled",
            JobStatus::NotRunning => "not_running",
            JobStatus::NoTests => "no_tests",
            JobStatus::Fixed => "fixed",
            JobStatus::Success => "success",
        }
    }

    /// Whether a job with this status counts towards duration and success statistics.
    pub fn is_countable(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CIToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CIToolError::Config(format!("Unexpected job status value: {s}")))
    }
}

/// Status filter accepted by the CircleCI "recent builds" endpoints.
///
/// These are not job statuses: `completed` and `successful` only exist as query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Completed,
    Successful,
    Failed,
    Running,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::Completed => "completed",
            StatusFilter::Successful => "successful",
            StatusFilter::Failed => "failed",
            StatusFilter::Running => "running",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CIToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(StatusFilter::Completed),
            "successful" => Ok(StatusFilter::Successful),
            "failed" => Ok(StatusFilter::Failed),
            "running" => Ok(StatusFilter::Running),
            other => Err(CIToolError::Config(format!(
                "Unexpected job status filter value: {other} (expected completed, successful, failed or running)"
            ))),
        }
    }
}

/// The `workflows` object of a build result. Only the job name is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkflow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_name: String,
}

/// A single CircleCI build result exactly as it appears in the downloaded JSON pages.
///
/// Timestamps are kept as strings here and parsed when converting into a
/// [`JobRecord`](crate::analysis::JobRecord).
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reponame: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch: String,
    #[serde(default)]
    pub build_num: u64,
    pub status: JobStatus,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub stop_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflows: RawWorkflow,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_status_round_trips_through_its_wire_name() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_only_success_and_failed_are_countable() {
        let countable: Vec<JobStatus> = JobStatus::ALL
            .into_iter()
            .filter(|s| s.is_countable())
            .collect();

        assert_eq!(countable, vec![JobStatus::Failed, JobStatus::Success]);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("exploded".parse::<JobStatus>().is_err());
        assert!("SUCCESS".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(
            "successful".parse::<StatusFilter>().unwrap(),
            StatusFilter::Successful
        );
        let err = "success".parse::<StatusFilter>().unwrap_err();
        assert!(err.to_string().contains("success"));
    }

    #[test]
    fn test_deserialize_full_result() {
        let json = r#"{
            "username": "celo-org",
            "reponame": "celo-monorepo",
            "branch": "master",
            "build_num": 42,
            "status": "infrastructure_fail",
            "start_time": "2019-10-01T10:00:00.123Z",
            "stop_time": "2019-10-01T10:05:00.456Z",
            "workflows": { "job_name": "lint-checks", "workflow_name": "build" }
        }"#;

        let raw: RawJobResult = serde_json::from_str(json).unwrap();

        assert_eq!(raw.username, "celo-org");
        assert_eq!(raw.build_num, 42);
        assert_eq!(raw.status, JobStatus::InfrastructureFail);
        assert_eq!(raw.workflows.job_name, "lint-checks");
        assert_eq!(raw.start_time.as_deref(), Some("2019-10-01T10:00:00.123Z"));
    }

    #[test]
    fn test_deserialize_tolerates_nulls_for_jobs_that_never_ran() {
        let json = r#"{
            "username": "celo-org",
            "reponame": "celo-monorepo",
            "branch": null,
            "build_num": 7,
            "status": "not_run",
            "start_time": null,
            "stop_time": null,
            "workflows": null
        }"#;

        let raw: RawJobResult = serde_json::from_str(json).unwrap();

        assert_eq!(raw.branch, "");
        assert_eq!(raw.workflows.job_name, "");
        assert!(raw.start_time.is_none());
    }

    #[test]
    fn test_deserialize_rejects_unknown_status() {
        let json = r#"{ "status": "on_fire", "workflows": { "job_name": "x" } }"#;

        assert!(serde_json::from_str::<RawJobResult>(json).is_err());
    }
}

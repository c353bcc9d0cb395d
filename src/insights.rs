use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything one `analyze` run produced, ready for rendering or export.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub filtered_records: usize,
    /// Slowest job first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub durations: Vec<JobDuration>,
    /// Lowest failure rate first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_rates: Vec<JobSuccessRate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duration_series: Vec<SeriesReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_series: Vec<SeriesReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDuration {
    pub name: String,
    /// Truncated average, full precision.
    pub average_seconds: f64,
    /// Average rounded to the nearest second, for display.
    pub rounded_seconds: i64,
    pub frequency: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSuccessRate {
    pub name: String,
    pub success_count: u64,
    pub total_count: u64,
    pub success_percent: u64,
}

impl JobSuccessRate {
    /// `success/total (percent%)`
    pub fn display(&self) -> String {
        format!(
            "{}/{} ({}%)",
            self.success_count, self.total_count, self.success_percent
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesReport {
    pub name: String,
    /// Job results the series was built from, before smoothing.
    pub samples: usize,
    pub points: Vec<f64>,
}

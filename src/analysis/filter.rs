use log::info;

use super::record::JobRecord;

/// Optional criteria for selecting job results before analysis.
///
/// Every set criterion must match exactly (case-sensitive). An unset or empty
/// criterion imposes no constraint, so the default value keeps every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub username: Option<String>,
    pub repository_name: Option<String>,
    pub branch_name: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

impl FilterCriteria {
    /// Keeps only the records matching every active criterion, preserving order.
    pub fn apply(&self, records: &mut Vec<JobRecord>) {
        for (label, value) in self.active() {
            info!("Filtering on {label}: {value}");
        }

        let before = records.len();
        records.retain(|record| self.matches(record));
        info!("{} of {before} job results kept after filtering", records.len());
    }

    pub fn matches(&self, record: &JobRecord) -> bool {
        criterion_matches(self.username.as_deref(), &record.owner)
            && criterion_matches(self.repository_name.as_deref(), &record.repo)
            && criterion_matches(self.branch_name.as_deref(), &record.branch)
            && criterion_matches(self.name.as_deref(), &record.name)
            && criterion_matches(self.status.as_deref(), record.status.as_str())
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }

    fn active(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("username", &self.username),
            ("repository name", &self.repository_name),
            ("branch", &self.branch_name),
            ("job name", &self.name),
            ("job status", &self.status),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
    }
}

fn criterion_matches(criterion: Option<&str>, actual: &str) -> bool {
    match criterion {
        Some(expected) if !expected.is_empty() => expected == actual,
        _ => true,
    }
}

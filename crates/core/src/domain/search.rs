// Report search filter

use crate::domain::error::DomainError;
use crate::domain::report::JobReport;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Report field a search filters on (exact match)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchField {
    #[default]
    #[serde(rename = "job.wrNumber")]
    WrNumber,
    #[serde(rename = "job.jobName")]
    JobName,
    #[serde(rename = "machineName")]
    MachineName,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [
        SearchField::WrNumber,
        SearchField::JobName,
        SearchField::MachineName,
    ];

    /// Document path of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::WrNumber => "job.wrNumber",
            SearchField::JobName => "job.jobName",
            SearchField::MachineName => "machineName",
        }
    }

    /// Value of this field in `report`
    pub fn value_of<'a>(&self, report: &'a JobReport) -> &'a str {
        match self {
            SearchField::WrNumber => &report.job.wr_number,
            SearchField::JobName => &report.job.job_name,
            SearchField::MachineName => &report.machine_name,
        }
    }

    pub fn matches(&self, report: &JobReport, value: &str) -> bool {
        self.value_of(report) == value
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job.wrNumber" | "wr" | "wr-number" => Ok(SearchField::WrNumber),
            "job.jobName" | "job" | "job-name" => Ok(SearchField::JobName),
            "machineName" | "machine" | "machine-name" => Ok(SearchField::MachineName),
            other => Err(DomainError::UnknownSearchField(other.to_string())),
        }
    }
}

// Job Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Job ID (allocated from the creation instant, epoch ms)
pub type JobId = i64;

/// Placeholder for blank free-text identifiers
pub const NOT_AVAILABLE: &str = "N/A";

/// A unit of work queued on a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    pub wr_number: String,
    pub job_name: String,
    pub crate_count: u32,
}

impl Job {
    /// Create a job, defaulting blank identifiers to "N/A"
    pub fn new(
        job_id: JobId,
        wr_number: impl Into<String>,
        job_name: impl Into<String>,
        crate_count: u32,
    ) -> Self {
        Self {
            job_id,
            wr_number: or_not_available(wr_number.into()),
            job_name: or_not_available(job_name.into()),
            crate_count,
        }
    }

    /// Create a job from an unvalidated crate count.
    ///
    /// Negative counts (and counts that do not fit `u32`) are rejected here,
    /// before the machine state machine ever sees the job.
    pub fn try_new(
        job_id: JobId,
        wr_number: impl Into<String>,
        job_name: impl Into<String>,
        crate_count: i64,
    ) -> Result<Self> {
        let count =
            u32::try_from(crate_count).map_err(|_| DomainError::InvalidCrateCount(crate_count))?;
        Ok(Self::new(job_id, wr_number, job_name, count))
    }
}

fn or_not_available(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identifiers_default_to_na() {
        let job = Job::new(1, "", "   ", 0);
        assert_eq!(job.wr_number, "N/A");
        assert_eq!(job.job_name, "N/A");
    }

    #[test]
    fn test_identifiers_are_trimmed() {
        let job = Job::new(1, " WR-7890 ", "Main Assembly", 3);
        assert_eq!(job.wr_number, "WR-7890");
        assert_eq!(job.job_name, "Main Assembly");
        assert_eq!(job.crate_count, 3);
    }

    #[test]
    fn test_negative_crate_count_rejected() {
        let err = Job::try_new(1, "WR-1", "Coat A", -1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCrateCount(-1)));
    }

    #[test]
    fn test_oversized_crate_count_rejected() {
        assert!(Job::try_new(1, "WR-1", "Coat A", i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let job = Job::new(42, "WR-1", "Coat A", 5);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobId"], 42);
        assert_eq!(value["wrNumber"], "WR-1");
        assert_eq!(value["jobName"], "Coat A");
        assert_eq!(value["crateCount"], 5);
    }
}

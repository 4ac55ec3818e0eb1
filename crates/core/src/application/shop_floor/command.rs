// Shop-floor commands and their typed outcomes

use crate::domain::{Job, JobId, JobReport, Machine, ReportId};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Operator input for a new job, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddJobRequest {
    #[serde(default)]
    pub wr_number: String,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub crate_count: i64,
}

impl AddJobRequest {
    /// Validate into a Job carrying `job_id`
    pub fn into_job(self, job_id: JobId) -> Result<Job> {
        Job::try_new(job_id, self.wr_number, self.job_name, self.crate_count)
            .map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// A command against one machine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AddJob(AddJobRequest),
    StartMachine,
    ReportDowntime { reason: String },
    ResumeProduction,
    CompleteJob { job_id: JobId },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddJob(_) => "add_job",
            Command::StartMachine => "start_machine",
            Command::ReportDowntime { .. } => "report_downtime",
            Command::ResumeProduction => "resume_production",
            Command::CompleteJob { .. } => "complete_job",
        }
    }
}

/// Result of a prompt the operator may dismiss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Submission<T> {
    Submitted(T),
    Cancelled,
}


/// What happened when a report was handed to the job store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Persisted(ReportId),
    Failed(String),
    /// No report was produced (job not in the queue)
    Skipped,
}

impl PersistenceStatus {
    pub fn is_persisted(&self) -> bool {
        matches!(self, PersistenceStatus::Persisted(_))
    }
}

/// Updated machine plus the report generated by CompleteJob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub machine: Machine,
    pub report: Option<JobReport>,
    pub persistence: PersistenceStatus,
}

/// Result of dispatching a Command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Updated { machine: Machine },
    Completed(CompletionOutcome),
}

impl CommandOutcome {
    pub fn machine(&self) -> &Machine {
        match self {
            CommandOutcome::Updated { machine } => machine,
            CommandOutcome::Completed(outcome) => &outcome.machine,
        }
    }

    pub fn report(&self) -> Option<&JobReport> {
        match self {
            CommandOutcome::Updated { .. } => None,
            CommandOutcome::Completed(outcome) => outcome.report.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_job_request_rejects_negative_crates() {
        let req = AddJobRequest {
            wr_number: "WR-1".to_string(),
            job_name: "Coat A".to_string(),
            crate_count: -3,
        };
        let err = req.into_job(1).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_add_job_request_defaults_blank_fields() {
        let job = AddJobRequest::default().into_job(7).unwrap();
        assert_eq!(job.job_id, 7);
        assert_eq!(job.wr_number, "N/A");
        assert_eq!(job.job_name, "N/A");
        assert_eq!(job.crate_count, 0);
    }

    #[test]
    fn test_command_wire_format() {
        let cmd: Command =
            serde_json::from_str(r#"{"type":"report_downtime","reason":"Jam"}"#).unwrap();
        assert!(matches!(cmd, Command::ReportDowntime { ref reason } if reason == "Jam"));
        assert_eq!(cmd.name(), "report_downtime");
    }
}

//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Request fields are
//! snake_case; machine and report documents keep their camelCase shape.

use chamber_core::domain::{format_duration, JobId, JobReport, Machine, MachineId, StoredReport};
use serde::{Deserialize, Serialize};

/// machine.get.v1, machine.start.v1, machine.resume.v1
#[derive(Debug, Deserialize)]
pub struct MachineIdRequest {
    pub machine_id: MachineId,
}

/// machine.list.v1
#[derive(Debug, Default, Deserialize)]
pub struct ListMachinesRequest {}

/// machine.add_job.v1
#[derive(Debug, Deserialize)]
pub struct AddJobRequest {
    pub machine_id: MachineId,
    #[serde(default)]
    pub wr_number: String,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub crate_count: i64,
}

/// machine.report_downtime.v1
#[derive(Debug, Deserialize)]
pub struct ReportDowntimeRequest {
    pub machine_id: MachineId,
    #[serde(default)]
    pub reason: String,
}

/// machine.complete_job.v1
#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    pub machine_id: MachineId,
    pub job_id: JobId,
}

/// Machine snapshot plus the running clock
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineView {
    #[serde(flatten)]
    pub machine: Machine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<i64>,
    /// Formatted elapsed time, present while a run is in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
}

impl MachineView {
    pub fn new(machine: Machine, elapsed_ms: Option<i64>) -> Self {
        Self {
            machine,
            elapsed_ms,
            elapsed: elapsed_ms.map(format_duration),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteJobResponse {
    pub machine: MachineView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<JobReport>,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

/// reports.search.v1
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    /// `job.wrNumber` (default), `job.jobName` or `machineName`
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub reports: Vec<StoredReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// reports.export.v1
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub report: JobReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub subject: String,
    pub body: String,
    /// `mailto:` link prefilled with the encoded subject and body
    pub mailto: String,
}

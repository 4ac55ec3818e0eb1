//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate.

use chamber_core::domain::{JobId, JobReport, Machine, MachineId, StoredReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MachineIdRequest {
    pub machine_id: MachineId,
}

/// Request to queue a job on a machine
#[derive(Debug, Clone, Serialize)]
pub struct AddJobRequest {
    pub machine_id: MachineId,
    pub wr_number: String,
    pub job_name: String,
    pub crate_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReportDowntimeRequest {
    pub machine_id: MachineId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompleteJobRequest {
    pub machine_id: MachineId,
    pub job_id: JobId,
}

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExportRequest<'a> {
    pub report: &'a JobReport,
}

/// Machine snapshot plus the running clock
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineView {
    #[serde(flatten)]
    pub machine: Machine,
    #[serde(default)]
    pub elapsed_ms: Option<i64>,
    #[serde(default)]
    pub elapsed: Option<String>,
}

/// Response from machine.complete_job.v1
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteJobResponse {
    pub machine: MachineView,
    #[serde(default)]
    pub report: Option<JobReport>,
    pub persisted: bool,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub persistence_error: Option<String>,
}

/// Response from reports.search.v1
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub reports: Vec<StoredReport>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from reports.export.v1
#[derive(Debug, Clone, Deserialize)]
pub struct ExportResponse {
    pub subject: String,
    pub body: String,
    /// `mailto:` link prefilled with the encoded subject and body
    pub mailto: String,
}

//! Chamber Monitor Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    AddJobRequest, CompleteJobRequest, CompleteJobResponse, ExportRequest, ExportResponse,
    MachineIdRequest, MachineView, ReportDowntimeRequest, SearchRequest, SearchResponse,
};
use chamber_core::domain::{JobId, JobReport, MachineId, SearchField};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Chamber Monitor Client
///
/// Typed access to the daemon's JSON-RPC API.
///
/// # Example
///
/// ```no_run
/// use chamber_sdk::ChamberClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ChamberClient::connect("http://127.0.0.1:9631").await?;
/// for view in client.list_machines().await? {
///     println!("{}: {}", view.machine.name(), view.machine.status());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChamberClient {
    client: HttpClient,
}

impl ChamberClient {
    /// Connect to the daemon at `url` (e.g. `http://127.0.0.1:9631`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let params = object_params(request)?;
        let response: Resp = self.client.request(method, params).await?;
        Ok(response)
    }

    /// All machines, ordered by id
    pub async fn list_machines(&self) -> Result<Vec<MachineView>> {
        let response: Vec<MachineView> = self
            .client
            .request("machine.list.v1", ObjectParams::new())
            .await?;
        Ok(response)
    }

    pub async fn machine(&self, machine_id: MachineId) -> Result<MachineView> {
        self.call("machine.get.v1", &MachineIdRequest { machine_id })
            .await
    }

    /// Queue a job. Rejected with code 4000 when `crate_count` is negative.
    pub async fn add_job(&self, request: AddJobRequest) -> Result<MachineView> {
        self.call("machine.add_job.v1", &request).await
    }

    pub async fn start_machine(&self, machine_id: MachineId) -> Result<MachineView> {
        self.call("machine.start.v1", &MachineIdRequest { machine_id })
            .await
    }

    pub async fn report_downtime(
        &self,
        machine_id: MachineId,
        reason: impl Into<String>,
    ) -> Result<MachineView> {
        let request = ReportDowntimeRequest {
            machine_id,
            reason: reason.into(),
        };
        self.call("machine.report_downtime.v1", &request).await
    }

    pub async fn resume_production(&self, machine_id: MachineId) -> Result<MachineView> {
        self.call("machine.resume.v1", &MachineIdRequest { machine_id })
            .await
    }

    /// Complete a queued job; the response says whether the report was saved
    pub async fn complete_job(
        &self,
        machine_id: MachineId,
        job_id: JobId,
    ) -> Result<CompleteJobResponse> {
        self.call(
            "machine.complete_job.v1",
            &CompleteJobRequest { machine_id, job_id },
        )
        .await
    }

    /// Search stored reports. A blank value lists everything.
    pub async fn search(
        &self,
        field: SearchField,
        value: impl Into<String>,
    ) -> Result<SearchResponse> {
        let request = SearchRequest {
            field: Some(field.as_str().to_string()),
            value: Some(value.into()),
        };
        self.call("reports.search.v1", &request).await
    }

    /// Every stored report, newest first
    pub async fn list_reports(&self) -> Result<SearchResponse> {
        self.call("reports.search.v1", &SearchRequest::default())
            .await
    }

    /// Email subject and plain-text body for a report
    pub async fn export_report(&self, report: &JobReport) -> Result<ExportResponse> {
        self.call("reports.export.v1", &ExportRequest { report })
            .await
    }
}

/// Named params from a serializable request struct
fn object_params<T: Serialize>(request: &T) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    match serde_json::to_value(request)? {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                params.insert(&key, value)?;
            }
            Ok(params)
        }
        other => Err(SdkError::Other(format!(
            "Request must serialize to an object, got {other}"
        ))),
    }
}

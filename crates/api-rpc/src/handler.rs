//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC params onto the shop-floor service and the
//! report search use case.

use crate::error::to_rpc_error;
use crate::types::{
    AddJobRequest, CompleteJobRequest, CompleteJobResponse, ExportRequest, ExportResponse,
    ListMachinesRequest, MachineIdRequest, MachineView, ReportDowntimeRequest, SearchRequest,
    SearchResponse,
};
use chamber_core::application::shop_floor;
use chamber_core::application::{search, PersistenceStatus, SearchQuery, ShopFloorService};
use chamber_core::domain::{mailto_link, Machine, SearchField};
use chamber_core::error::AppError;
use chamber_core::port::JobStore;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::warn;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<ShopFloorService>,
    store: Arc<dyn JobStore>,
}

impl RpcHandler {
    pub fn new(service: Arc<ShopFloorService>, store: Arc<dyn JobStore>) -> Self {
        Self { service, store }
    }

    async fn view(&self, machine: Machine) -> Result<MachineView, ErrorObjectOwned> {
        let elapsed_ms = self
            .service
            .elapsed(machine.id())
            .await
            .map_err(to_rpc_error)?;
        Ok(MachineView::new(machine, elapsed_ms))
    }

    /// machine.list.v1
    pub async fn list_machines(
        &self,
        _params: ListMachinesRequest,
    ) -> Result<Vec<MachineView>, ErrorObjectOwned> {
        let machines = self.service.list_machines().await;
        let mut views = Vec::with_capacity(machines.len());
        for machine in machines {
            views.push(self.view(machine).await?);
        }
        Ok(views)
    }

    /// machine.get.v1
    pub async fn get_machine(
        &self,
        params: MachineIdRequest,
    ) -> Result<MachineView, ErrorObjectOwned> {
        let machine = self
            .service
            .machine(params.machine_id)
            .await
            .map_err(to_rpc_error)?;
        self.view(machine).await
    }

    /// machine.add_job.v1
    pub async fn add_job(&self, params: AddJobRequest) -> Result<MachineView, ErrorObjectOwned> {
        let req = shop_floor::AddJobRequest {
            wr_number: params.wr_number,
            job_name: params.job_name,
            crate_count: params.crate_count,
        };
        let machine = self
            .service
            .add_job(params.machine_id, req)
            .await
            .map_err(to_rpc_error)?;
        self.view(machine).await
    }

    /// machine.start.v1
    pub async fn start_machine(
        &self,
        params: MachineIdRequest,
    ) -> Result<MachineView, ErrorObjectOwned> {
        let machine = self
            .service
            .start_machine(params.machine_id)
            .await
            .map_err(to_rpc_error)?;
        self.view(machine).await
    }

    /// machine.report_downtime.v1
    pub async fn report_downtime(
        &self,
        params: ReportDowntimeRequest,
    ) -> Result<MachineView, ErrorObjectOwned> {
        let machine = self
            .service
            .report_downtime(params.machine_id, params.reason)
            .await
            .map_err(to_rpc_error)?;
        self.view(machine).await
    }

    /// machine.resume.v1
    pub async fn resume_production(
        &self,
        params: MachineIdRequest,
    ) -> Result<MachineView, ErrorObjectOwned> {
        let machine = self
            .service
            .resume_production(params.machine_id)
            .await
            .map_err(to_rpc_error)?;
        self.view(machine).await
    }

    /// machine.complete_job.v1
    pub async fn complete_job(
        &self,
        params: CompleteJobRequest,
    ) -> Result<CompleteJobResponse, ErrorObjectOwned> {
        let outcome = self
            .service
            .complete_job(params.machine_id, params.job_id)
            .await
            .map_err(to_rpc_error)?;

        let (report_id, persistence_error) = match outcome.persistence {
            PersistenceStatus::Persisted(id) => (Some(id), None),
            PersistenceStatus::Failed(message) => (None, Some(message)),
            PersistenceStatus::Skipped => (None, None),
        };

        Ok(CompleteJobResponse {
            machine: self.view(outcome.machine).await?,
            report: outcome.report,
            persisted: report_id.is_some(),
            report_id,
            persistence_error,
        })
    }

    /// reports.search.v1
    pub async fn search_reports(
        &self,
        params: SearchRequest,
    ) -> Result<SearchResponse, ErrorObjectOwned> {
        let field = match params.field.as_deref().map(str::trim) {
            None | Some("") => SearchField::default(),
            Some(raw) => raw
                .parse::<SearchField>()
                .map_err(|e| to_rpc_error(AppError::Validation(e.to_string())))?,
        };
        let query = SearchQuery::new(field, params.value.unwrap_or_default());

        let results = search(self.store.as_ref(), &query).await.map_err(|e| {
            warn!(error = %e, field = %field, "Report search failed");
            to_rpc_error(e)
        })?;

        Ok(SearchResponse {
            message: results.empty_message().map(str::to_string),
            reports: results.reports,
        })
    }

    /// reports.export.v1
    pub async fn export_report(
        &self,
        params: ExportRequest,
    ) -> Result<ExportResponse, ErrorObjectOwned> {
        let subject = params.report.email_subject();
        let body = params.report.render_local_text();
        Ok(ExportResponse {
            mailto: mailto_link(&subject, &body),
            subject,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use chamber_core::application::default_roster;
    use chamber_core::domain::MachineStatus;
    use chamber_core::port::job_store::mocks::InMemoryJobStore;
    use chamber_core::port::time_provider::mocks::ManualClock;

    const T0: i64 = 1_709_625_600_000;

    fn handler() -> (RpcHandler, Arc<ManualClock>, Arc<InMemoryJobStore>) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(InMemoryJobStore::new());
        let service =
            Arc::new(ShopFloorService::new(default_roster(), store.clone(), clock.clone()).unwrap());
        (RpcHandler::new(service, store.clone()), clock, store)
    }

    fn add_job(machine_id: u32, wr: &str, crates: i64) -> AddJobRequest {
        AddJobRequest {
            machine_id,
            wr_number: wr.to_string(),
            job_name: "Coat A".to_string(),
            crate_count: crates,
        }
    }

    #[tokio::test]
    async fn test_start_reports_elapsed() {
        let (handler, _, _) = handler();
        handler.add_job(add_job(1, "WR-1", 5)).await.unwrap();
        let view = handler
            .start_machine(MachineIdRequest { machine_id: 1 })
            .await
            .unwrap();

        assert_eq!(view.machine.status(), MachineStatus::Running);
        assert_eq!(view.elapsed_ms, Some(0));
        assert_eq!(view.elapsed.as_deref(), Some("0s"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "Running");
        assert_eq!(json["startTime"], T0);
    }

    #[tokio::test]
    async fn test_complete_job_persists() {
        let (handler, clock, store) = handler();
        let view = handler.add_job(add_job(2, "WR-7", 1)).await.unwrap();
        let job_id = view.machine.jobs().iter().next().unwrap().job_id;
        handler
            .start_machine(MachineIdRequest { machine_id: 2 })
            .await
            .unwrap();
        clock.advance(90_000);

        let resp = handler
            .complete_job(CompleteJobRequest {
                machine_id: 2,
                job_id,
            })
            .await
            .unwrap();
        assert!(resp.persisted);
        assert!(resp.report_id.is_some());
        assert_eq!(resp.report.unwrap().total_production_time, "1m 30s");
        assert!(resp.machine.elapsed.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_job_reports_store_failure() {
        let (handler, _, store) = handler();
        let view = handler.add_job(add_job(3, "WR-8", 1)).await.unwrap();
        let job_id = view.machine.jobs().iter().next().unwrap().job_id;
        store.set_unavailable(true);

        let resp = handler
            .complete_job(CompleteJobRequest {
                machine_id: 3,
                job_id,
            })
            .await
            .unwrap();
        assert!(!resp.persisted);
        assert!(resp.persistence_error.unwrap().contains("unreachable"));
        assert!(resp.machine.machine.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_validation_and_not_found_codes() {
        let (handler, _, _) = handler();
        let err = handler.add_job(add_job(1, "WR-1", -5)).await.unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);

        let err = handler
            .get_machine(MachineIdRequest { machine_id: 42 })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);

        let err = handler
            .search_reports(SearchRequest {
                field: Some("crates".to_string()),
                value: Some("5".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_search_messages() {
        let (handler, _, store) = handler();
        let resp = handler.search_reports(SearchRequest::default()).await.unwrap();
        assert!(resp.reports.is_empty());
        assert_eq!(
            resp.message.as_deref(),
            Some("There are no completed jobs in the database yet.")
        );

        let resp = handler
            .search_reports(SearchRequest {
                field: Some("job.wrNumber".to_string()),
                value: Some("WR-1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(resp.message.as_deref(), Some("No results found for your search."));

        store.set_unavailable(true);
        let err = handler
            .search_reports(SearchRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::DB_ERROR);
    }

    #[tokio::test]
    async fn test_list_machines() {
        let (handler, _, _) = handler();
        let views = handler
            .list_machines(ListMachinesRequest::default())
            .await
            .unwrap();
        assert_eq!(views.len(), 8);
        assert_eq!(views[1].machine.name(), "McKenzie 5");
        assert!(views.iter().all(|v| v.elapsed.is_none()));
    }

    #[tokio::test]
    async fn test_export_report_builds_mailto() {
        let (handler, clock, _) = handler();
        let view = handler.add_job(add_job(4, "WR-9", 2)).await.unwrap();
        let job_id = view.machine.jobs().iter().next().unwrap().job_id;
        handler
            .start_machine(MachineIdRequest { machine_id: 4 })
            .await
            .unwrap();
        clock.advance(60_000);
        let report = handler
            .complete_job(CompleteJobRequest {
                machine_id: 4,
                job_id,
            })
            .await
            .unwrap()
            .report
            .unwrap();

        let export = handler
            .export_report(ExportRequest { report })
            .await
            .unwrap();
        assert_eq!(export.subject, "Job Report: Coat A (WR: WR-9)");
        assert!(export.body.starts_with("JOB COMPLETION REPORT\n"));
        assert!(export
            .mailto
            .starts_with("mailto:?subject=Job%20Report%3A%20Coat%20A%20(WR%3A%20WR-9)&body="));
        assert!(export.mailto.contains("JOB%20COMPLETION%20REPORT%0A"));
        assert!(!export.mailto.contains(' '));
    }
}

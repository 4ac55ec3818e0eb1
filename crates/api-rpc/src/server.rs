//! JSON-RPC Server
//!
//! Serves the shop-floor API over HTTP on a localhost TCP port.

use crate::error::RpcServerError;
use crate::handler::RpcHandler;
use crate::types::{
    AddJobRequest, CompleteJobRequest, ExportRequest, ListMachinesRequest, MachineIdRequest,
    ReportDowntimeRequest, SearchRequest,
};
use chamber_core::application::ShopFloorService;
use chamber_core::port::JobStore;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9631;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks an ephemeral port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        service: Arc<ShopFloorService>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service, store)),
        }
    }

    /// Start the JSON-RPC server, returning the bound address and its handle
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), RpcServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|source| RpcServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = server.local_addr().map_err(|source| RpcServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let module = self.build_module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started");
        Ok((local_addr, handle))
    }

    fn build_module(&self) -> Result<RpcModule<()>, RpcServerError> {
        let mut module = RpcModule::new(());

        // Machines
        let handler = self.handler.clone();
        module
            .register_async_method("machine.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListMachinesRequest = if params.is_object() {
                        params.parse()?
                    } else {
                        ListMachinesRequest::default()
                    };
                    handler.list_machines(req).await
                }
            })
            .map_err(|e| register_error("machine.list.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("machine.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MachineIdRequest = params.parse()?;
                    handler.get_machine(req).await
                }
            })
            .map_err(|e| register_error("machine.get.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("machine.add_job.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AddJobRequest = params.parse()?;
                    handler.add_job(req).await
                }
            })
            .map_err(|e| register_error("machine.add_job.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("machine.start.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MachineIdRequest = params.parse()?;
                    handler.start_machine(req).await
                }
            })
            .map_err(|e| register_error("machine.start.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("machine.report_downtime.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ReportDowntimeRequest = params.parse()?;
                    handler.report_downtime(req).await
                }
            })
            .map_err(|e| register_error("machine.report_downtime.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("machine.resume.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MachineIdRequest = params.parse()?;
                    handler.resume_production(req).await
                }
            })
            .map_err(|e| register_error("machine.resume.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("machine.complete_job.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CompleteJobRequest = params.parse()?;
                    handler.complete_job(req).await
                }
            })
            .map_err(|e| register_error("machine.complete_job.v1", e))?;

        // Reports
        let handler = self.handler.clone();
        module
            .register_async_method("reports.search.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SearchRequest = if params.is_object() {
                        params.parse()?
                    } else {
                        SearchRequest::default()
                    };
                    handler.search_reports(req).await
                }
            })
            .map_err(|e| register_error("reports.search.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("reports.export.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ExportRequest = params.parse()?;
                    handler.export_report(req).await
                }
            })
            .map_err(|e| register_error("reports.export.v1", e))?;

        Ok(module)
    }
}

fn register_error(method: &'static str, err: impl std::fmt::Display) -> RpcServerError {
    RpcServerError::Register {
        method,
        message: err.to_string(),
    }
}

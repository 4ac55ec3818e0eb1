//! Chamber Monitor SDK - Rust Client Library
//!
//! Provides a typed client for the Chamber Monitor daemon.
//!
//! # Example
//!
//! ```no_run
//! use chamber_sdk::{AddJobRequest, ChamberClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ChamberClient::connect("http://127.0.0.1:9631").await?;
//!
//!     let view = client
//!         .add_job(AddJobRequest {
//!             machine_id: 1,
//!             wr_number: "WR-1".to_string(),
//!             job_name: "Coat A".to_string(),
//!             crate_count: 5,
//!         })
//!         .await?;
//!     println!("{} has {} queued jobs", view.machine.name(), view.machine.jobs().len());
//!
//!     client.start_machine(1).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::ChamberClient;
pub use error::{code, Result, SdkError};
pub use types::{
    AddJobRequest, CompleteJobResponse, ExportResponse, MachineView, SearchResponse,
};

// Domain documents carried by responses
pub use chamber_core::domain::{
    Job, JobId, JobReport, Machine, MachineId, MachineStatus, SearchField, StoredReport,
};

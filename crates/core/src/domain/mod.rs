// Domain Layer - Pure business logic and entities

pub mod downtime;
pub mod error;
pub mod format;
pub mod job;
pub mod machine;
pub mod queue;
pub mod report;
pub mod search;

// Re-exports
pub use downtime::{DowntimeInterval, DowntimeLog, OpenDowntime, DEFAULT_DOWNTIME_REASON};
pub use error::DomainError;
pub use format::{format_duration, format_timestamp};
pub use job::{Job, JobId, NOT_AVAILABLE};
pub use machine::{Machine, MachineId, MachineStatus};
pub use queue::JobQueue;
pub use report::{mailto_link, JobReport, ReportId, StoredReport};
pub use search::SearchField;

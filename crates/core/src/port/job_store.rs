// Job Store Port (Interface)

use crate::domain::{JobReport, ReportId, SearchField, StoredReport};
use crate::error::Result;
use async_trait::async_trait;

/// Append-only store of finished-job reports.
///
/// Result ordering is unspecified; callers sort by finish time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist one report, returning its store-assigned id
    async fn create(&self, report: &JobReport) -> Result<ReportId>;

    /// Reports whose `field` equals `value` exactly
    async fn query_by(&self, field: SearchField, value: &str) -> Result<Vec<StoredReport>>;

    /// Every stored report
    async fn list_all(&self) -> Result<Vec<StoredReport>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory JobStore for tests and local runs
    #[derive(Default)]
    pub struct InMemoryJobStore {
        reports: Mutex<Vec<StoredReport>>,
        next_id: AtomicU64,
        unavailable: AtomicBool,
    }

    impl InMemoryJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate an unreachable store: every call fails while set
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub fn len(&self) -> usize {
            self.reports.lock().map(|r| r.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AppError::Database("Job store unreachable".to_string()));
            }
            Ok(())
        }

        fn snapshot(&self) -> Result<Vec<StoredReport>> {
            self.reports
                .lock()
                .map(|r| r.clone())
                .map_err(|e| AppError::Internal(format!("Job store lock poisoned: {e}")))
        }
    }

    #[async_trait]
    impl JobStore for InMemoryJobStore {
        async fn create(&self, report: &JobReport) -> Result<ReportId> {
            self.check_available()?;
            let id = format!("report-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            self.reports
                .lock()
                .map_err(|e| AppError::Internal(format!("Job store lock poisoned: {e}")))?
                .push(StoredReport {
                    id: id.clone(),
                    report: report.clone(),
                });
            Ok(id)
        }

        async fn query_by(&self, field: SearchField, value: &str) -> Result<Vec<StoredReport>> {
            self.check_available()?;
            Ok(self
                .snapshot()?
                .into_iter()
                .filter(|stored| field.matches(&stored.report, value))
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<StoredReport>> {
            self.check_available()?;
            self.snapshot()
        }
    }
}

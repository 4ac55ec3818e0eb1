// SQLite JobStore Implementation

use async_trait::async_trait;
use chamber_core::domain::{
    DowntimeInterval, Job, JobReport, ReportId, SearchField, StoredReport,
};
use chamber_core::error::{AppError, Result};
use chamber_core::port::{IdProvider, JobStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "275" => AppError::Database(format!(
                        "Check constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {col}")),
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            AppError::Database(format!("Job store unavailable: {err}"))
        }
        _ => AppError::Database(err.to_string()),
    }
}

const SELECT_REPORTS: &str = r#"
    SELECT id, machine_name, job_id, wr_number, job_name, crate_count,
           start_time, finish_time, downtime_logs,
           total_production_time, total_downtime,
           total_production_ms, total_downtime_ms
    FROM job_reports
"#;

/// Filter column for a search field
fn column_for(field: SearchField) -> &'static str {
    match field {
        SearchField::WrNumber => "wr_number",
        SearchField::JobName => "job_name",
        SearchField::MachineName => "machine_name",
    }
}

pub struct SqliteJobStore {
    pool: SqlitePool,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJobStore {
    pub fn new(
        pool: SqlitePool,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            pool,
            id_provider,
            time_provider,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored reports
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM job_reports")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    fn into_stored(rows: Vec<ReportRow>) -> Result<Vec<StoredReport>> {
        rows.into_iter().map(ReportRow::into_stored).collect()
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create(&self, report: &JobReport) -> Result<ReportId> {
        let id = self.id_provider.generate_id();
        let downtime_logs = serde_json::to_string(&report.downtime_logs)?;

        sqlx::query(
            r#"
            INSERT INTO job_reports (
                id, machine_name, job_id, wr_number, job_name, crate_count,
                start_time, finish_time, downtime_logs,
                total_production_time, total_downtime,
                total_production_ms, total_downtime_ms, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&report.machine_name)
        .bind(report.job.job_id)
        .bind(&report.job.wr_number)
        .bind(&report.job.job_name)
        .bind(i64::from(report.job.crate_count))
        .bind(report.start_time)
        .bind(report.finish_time)
        .bind(&downtime_logs)
        .bind(&report.total_production_time)
        .bind(&report.total_downtime)
        .bind(report.total_production_ms)
        .bind(report.total_downtime_ms)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(report_id = %id, machine = %report.machine_name, "Report row inserted");
        Ok(id)
    }

    async fn query_by(&self, field: SearchField, value: &str) -> Result<Vec<StoredReport>> {
        let sql = format!(
            "{SELECT_REPORTS} WHERE {} = ? ORDER BY finish_time DESC",
            column_for(field)
        );
        let rows = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::into_stored(rows)
    }

    async fn list_all(&self) -> Result<Vec<StoredReport>> {
        let sql = format!("{SELECT_REPORTS} ORDER BY finish_time DESC");
        let rows = sqlx::query_as::<_, ReportRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::into_stored(rows)
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    machine_name: String,
    job_id: i64,
    wr_number: String,
    job_name: String,
    crate_count: i64,
    start_time: Option<i64>,
    finish_time: i64,
    downtime_logs: String,
    total_production_time: String,
    total_downtime: String,
    total_production_ms: i64,
    total_downtime_ms: i64,
}

impl ReportRow {
    fn into_stored(self) -> Result<StoredReport> {
        let downtime_logs: Vec<DowntimeInterval> = serde_json::from_str(&self.downtime_logs)?;
        let crate_count = u32::try_from(self.crate_count).map_err(|_| {
            AppError::Database(format!(
                "Report {} has invalid crate count {}",
                self.id, self.crate_count
            ))
        })?;

        Ok(StoredReport {
            id: self.id,
            report: JobReport {
                machine_name: self.machine_name,
                job: Job {
                    job_id: self.job_id,
                    wr_number: self.wr_number,
                    job_name: self.job_name,
                    crate_count,
                },
                start_time: self.start_time,
                finish_time: self.finish_time,
                downtime_logs,
                total_production_time: self.total_production_time,
                total_downtime: self.total_downtime,
                total_production_ms: self.total_production_ms,
                total_downtime_ms: self.total_downtime_ms,
            },
        })
    }
}

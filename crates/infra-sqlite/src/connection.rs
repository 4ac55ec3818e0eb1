// SQLite Connection Pool Setup

use chamber_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create SQLite connection pool with WAL mode
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    if !database_url.starts_with("sqlite:") {
        return Err(AppError::Config(format!(
            "Unsupported database url {database_url}: expected sqlite:"
        )));
    }
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("Invalid database url {database_url}: {e}")))?;
    connect(options).await
}

/// Open (creating if missing) the report database at `path`
pub async fn create_pool_at(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    connect(SqliteConnectOptions::new().filename(path)).await
}

async fn connect(options: SqliteConnectOptions) -> Result<SqlitePool> {
    let options = options
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;

    debug!(max_connections = MAX_CONNECTIONS, "SQLite pool ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_core::port::id_provider::{IdProvider, UuidProvider};

    #[tokio::test]
    async fn test_create_pool() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let result = create_pool("postgres://nope").await;
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = create_pool("reports.db").await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_create_pool_at_makes_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("chamber-pool-{}", UuidProvider.generate_id()));
        let path = dir.join("nested").join("reports.db");

        let pool = create_pool_at(&path).await.unwrap();
        assert!(pool.acquire().await.is_ok());
        assert!(path.exists());

        pool.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }
}

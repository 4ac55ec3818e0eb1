// Chamber Infrastructure - SQLite Adapter
// Implements: JobStore

mod connection;
mod job_store;
mod migration;

pub use connection::{create_pool, create_pool_at};
pub use job_store::SqliteJobStore;
pub use migration::{current_version, run_migrations};

pub(crate) use job_store::map_sqlx_error;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)

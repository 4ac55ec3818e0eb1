//! Chamber Monitor - Main Entry Point
//!
//! Composition root: configuration, logging, SQLite job store, shop-floor
//! service and the JSON-RPC server.

mod config;
mod logging;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use chamber_api_rpc::{RpcServer, RpcServerConfig};
use chamber_core::application::ShopFloorService;
use chamber_core::port::id_provider::UuidProvider;
use chamber_core::port::time_provider::SystemTimeProvider;
use chamber_core::port::{JobStore, TimeProvider};
use chamber_infra_sqlite::{create_pool_at, run_migrations, SqliteJobStore};
use crate::config::DaemonConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration (before logging, so log settings apply)
    let config = DaemonConfig::load().context("Failed to load configuration")?;

    // 2. Logging
    let log_guard = logging::init(&config)?;
    info!(version = VERSION, "Chamber Monitor starting");

    // 3. Database
    let db_path = config.db_path();
    info!(db_path = %db_path.display(), "Opening report database");
    let pool = create_pool_at(&db_path)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(
        pool.clone(),
        Arc::new(UuidProvider),
        time_provider.clone(),
    ));
    let service = Arc::new(
        ShopFloorService::new(config.machines.clone(), store.clone(), time_provider)
            .context("Failed to build shop floor")?
            .with_tick_interval(config.tick_interval()),
    );
    info!(machines = service.machine_count(), "Shop floor ready");

    // 5. JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let (addr, rpc_handle) = RpcServer::new(rpc_config, service.clone(), store)
        .start()
        .await
        .context("RPC server start failed")?;

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, rpc_handle.stopped())
        .await
        .is_err()
    {
        error!("RPC server did not stop within timeout");
    }
    service.shutdown().await;
    pool.close().await;

    info!("Shutdown complete.");
    log_guard.shutdown();

    Ok(())
}

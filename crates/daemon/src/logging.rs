//! Log subscriber setup

use crate::config::{DaemonConfig, LogFormat};
use crate::telemetry;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "chamber=info";
const LOG_FILE_NAME: &str = "chamber-monitor.log";

pub type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Keeps background log writers alive; flush on drop
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
    telemetry: telemetry::TelemetryGuard,
}

impl LoggingGuard {
    pub fn shutdown(self) {
        self.telemetry.shutdown();
    }
}

/// Install the global subscriber: console (pretty or JSON), an optional
/// rolling file, and OpenTelemetry when enabled
pub fn init(config: &DaemonConfig) -> Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(match config.log_format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    });

    let file_guard = match config.log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    let (telemetry_layer, telemetry_guard) = telemetry::init_telemetry()?;
    if let Some(layer) = telemetry_layer {
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")?;

    telemetry_guard.log_status();

    Ok(LoggingGuard {
        _file: file_guard,
        telemetry: telemetry_guard,
    })
}

//! Telemetry setup for OpenTelemetry integration

use crate::logging::BoxedLayer;
use anyhow::Result;

#[cfg(feature = "telemetry")]
const DEFAULT_SERVICE_NAME: &str = "chamber-monitor";

/// Outcome of telemetry setup, reported once logging is up
pub struct TelemetryGuard {
    endpoint: Option<String>,
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl TelemetryGuard {
    pub fn log_status(&self) {
        match &self.endpoint {
            None => {
                tracing::debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)")
            }
            #[cfg(feature = "telemetry")]
            Some(endpoint) => tracing::info!(endpoint = %endpoint, "OpenTelemetry export enabled"),
            #[cfg(not(feature = "telemetry"))]
            Some(endpoint) => {
                tracing::warn!(
                    endpoint = %endpoint,
                    "OpenTelemetry endpoint set but feature 'telemetry' not enabled"
                );
                tracing::warn!("Rebuild with: cargo build --features telemetry");
            }
        }
    }

    /// Flush pending spans
    pub fn shutdown(self) {
        #[cfg(feature = "telemetry")]
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "OpenTelemetry shutdown failed");
            }
        }
    }
}

/// Build the OpenTelemetry layer if enabled
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: chamber-monitor)
pub fn init_telemetry() -> Result<(Option<BoxedLayer>, TelemetryGuard)> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

    #[cfg(feature = "telemetry")]
    let (layer, provider) = match &endpoint {
        Some(endpoint) => {
            let (layer, provider) = init_telemetry_impl(endpoint)?;
            (Some(layer), Some(provider))
        }
        None => (None, None),
    };

    #[cfg(not(feature = "telemetry"))]
    let layer = None;

    Ok((
        layer,
        TelemetryGuard {
            endpoint,
            #[cfg(feature = "telemetry")]
            provider,
        },
    ))
}

#[cfg(feature = "telemetry")]
fn init_telemetry_impl(
    endpoint: &str,
) -> Result<(BoxedLayer, opentelemetry_sdk::trace::TracerProvider)> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
    use tracing_subscriber::Layer;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();

    let tracer = provider.tracer(service_name);
    let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();

    Ok((layer, provider))
}

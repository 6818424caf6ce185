//! Tracing and OpenTelemetry setup for the imis CLI
//!
//! Usage:
//!   imis --debug serve              # Debug logging to console
//!   imis --otel serve               # Export traces to OTLP endpoint
//!   RUST_LOG=imis_server=debug imis # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG                        # Log filter (default: info, plus tower_http request spans)
//!   OTEL_EXPORTER_OTLP_ENDPOINT     # OTLP endpoint (default: http://localhost:4317)
//!   OTEL_SERVICE_NAME               # Service name (default: imis)

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Everything below the global filter shares this subscriber type.
type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync>;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (sets the filter to debug if RUST_LOG is unset)
    pub debug: bool,
    /// Enable OpenTelemetry OTLP export
    pub otel: bool,
}

impl TracingConfig {
    fn fallback_directives(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info,tower_http=debug"
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.fallback_directives()))
    }
}

/// Destination for exported spans.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OtlpTarget {
    endpoint: String,
    service_name: String,
}

impl OtlpTarget {
    const DEFAULT_ENDPOINT: &'static str = "http://localhost:4317";
    const DEFAULT_SERVICE: &'static str = "imis";

    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_owned()),
            service_name: non_empty("OTEL_SERVICE_NAME").unwrap_or_else(|| Self::DEFAULT_SERVICE.to_owned()),
        }
    }
}

/// Build the OTLP span layer and install its provider globally.
#[cfg(feature = "telemetry")]
fn otlp_layer(target: &OtlpTarget) -> Result<BoxedLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(target.endpoint.as_str())
        .build()
        .map_err(|e| anyhow!("OTLP exporter for {}: {}", target.endpoint, e))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new([
            KeyValue::new("service.name", target.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build();

    let layer = tracing_opentelemetry::layer().with_tracer(provider.tracer("imis"));
    // The global slot keeps the provider (and its batch worker) alive.
    let _ = opentelemetry::global::set_tracer_provider(provider);
    Ok(layer.boxed())
}

/// Flush pending spans
#[cfg(feature = "telemetry")]
pub fn shutdown_otel() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(not(feature = "telemetry"))]
pub fn shutdown_otel() {}

/// Install the global subscriber: console output always, OTLP export
/// when `--otel` is set and the binary carries the telemetry feature.
pub fn init(config: &TracingConfig) -> Result<()> {
    let export_to = config.otel.then(OtlpTarget::from_env);

    #[cfg_attr(not(feature = "telemetry"), allow(unused_mut))]
    let mut layers: Vec<BoxedLayer> = vec![fmt::layer().with_target(config.debug).compact().boxed()];
    #[cfg(feature = "telemetry")]
    if let Some(target) = &export_to {
        layers.push(otlp_layer(target)?);
    }

    tracing_subscriber::registry()
        .with(config.filter())
        .with(layers)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    match export_to {
        Some(target) if cfg!(feature = "telemetry") => tracing::info!(
            endpoint = %target.endpoint,
            service = %target.service_name,
            "exporting spans over OTLP"
        ),
        Some(_) => tracing::warn!("--otel ignored: built without the telemetry feature"),
        None => {}
    }
    Ok(())
}

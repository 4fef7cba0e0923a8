//! Tracing subscriber setup.

use super::file_writer::RotationPolicy;
use super::tracer::{self, ExportTarget};
use crate::infrastructure::paths;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use std::path::PathBuf;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service and scope name reported on every exported span.
pub const SERVICE_NAME: &str = "facetsync";

/// Default trace file name inside the data directory.
pub const TRACE_FILE_NAME: &str = "facetsync-otlp.json";

/// Installs the global tracing subscriber with file-based OTLP export.
///
/// # Parameters
///
/// * `config` - Supplies `trace_level` and `trace_file`
///
/// # Level Resolution
///
/// 1. `RUST_LOG`, if set and valid
/// 2. `config.trace_level`
/// 3. `"info"`
///
/// # File Location
///
/// `config.trace_file` (with `~` expanded) if set, otherwise
/// `facetsync-otlp.json` in the data directory (see
/// [`get_data_dir`](crate::infrastructure::get_data_dir)).
///
/// Observability is optional: if the directory cannot be created nothing is
/// installed. Only the first call in a process takes effect.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.trace_level.as_deref().unwrap_or("info"))
    });

    let file_path = trace_file_path(config);
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let resource = Resource::new(vec![opentelemetry::KeyValue::new("service.name", SERVICE_NAME)]);
    let provider = tracer::create_tracer_provider(
        ExportTarget {
            file_path,
            scope_name: SERVICE_NAME.to_string(),
            rotation: RotationPolicy::default(),
        },
        resource,
    );

    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init();
}

fn trace_file_path(config: &Config) -> PathBuf {
    config.trace_file.as_deref().map_or_else(
        || paths::get_data_dir().join(TRACE_FILE_NAME),
        |file| PathBuf::from(paths::expand_tilde(file)),
    )
}

//! OpenTelemetry-based observability with file-based trace export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → OpenTelemetry SDK → FileSpanExporter → JSON lines
//! ```
//!
//! Each line of the trace file is one OTLP JSON document holding a batch of
//! finished spans. The file rotates at 10 MB, keeping 3 numbered backups.
//!
//! Fetch commands carry the trace context of the intent that caused them
//! (see [`TraceContext`](crate::fetch::TraceContext)), so a request span
//! spawned on another task still nests under the dispatch that issued it.
//!
//! # Configuration
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` in the configuration
//! 3. Default: `"info"`
//!
//! # Usage
//!
//! ```rust
//! use facetsync::observability::init_tracing;
//! use facetsync::Config;
//!
//! let dir = std::env::temp_dir().join("facetsync-doc-traces");
//! let config = Config {
//!     trace_file: Some(dir.join("traces.json").display().to_string()),
//!     ..Config::default()
//! };
//! init_tracing(&config);
//!
//! tracing::debug!("tracing is now active");
//! ```
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `tracer`: Tracer provider with the file exporter
//! - `span_formatter`: OTLP JSON span encoding
//! - `file_writer`: Rotating line writer

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use init::{init_tracing, SERVICE_NAME, TRACE_FILE_NAME};

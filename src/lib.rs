//! facetsync: keeps catalog filter criteria, the address bar and data fetches in sync.
//!
//! facetsync provides:
//! - A canonical, memoized query-string encoding of filter criteria
//! - Tolerant decoding of any query string back into criteria
//! - Closure-aware category selection over a category tree
//! - Debounced, latest-wins fetch orchestration with prefetch and refetch
//! - An in-memory catalog data source and a line-driven CLI

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                      │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - Intents and the filter store                     │
//! │  - Address synchronizer                             │
//! │  - FilterSession wiring                             │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Query Layer   │   │ Fetch Layer   │   │ Source Layer  │
//! │ (query/)      │   │ (fetch/)      │   │ (source/)     │
//! │ - Encode      │   │ - Debounce    │   │ - DataSource  │
//! │ - Decode      │   │ - Latest-wins │   │ - In-memory   │
//! │ - Closures    │   │ - Runtime     │   │   catalog     │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Data directory paths (infrastructure/)           │
//! │  - Criteria, categories, pages, errors (domain/)    │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - OpenTelemetry tracing, file-based OTLP export    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Intents, store, address synchronizer, session
//! - [`domain`]: Criteria, category trees, request/response shapes, errors
//! - [`query`]: Canonical encoding, tolerant decoding, category closures
//! - [`fetch`]: Orchestrator state machine, timers, tokio runtime driver
//! - [`source`]: Data layer trait and in-memory catalog
//! - [`infrastructure`]: Data directory resolution
//! - [`observability`]: OpenTelemetry tracing
//!
//! # Configuration
//!
//! ```toml
//! # ~/.local/share/facetsync/config.toml
//! debounce_ms = 450
//! prefetch = true
//! request_timeout_ms = 10000
//! trace_level = "debug"
//! trace_file = "~/.local/share/facetsync/facetsync-otlp.json"
//! ```
//!
//! # Example
//!
//! ```rust
//! use facetsync::app::{FilterSession, Intent, MemoryAddress};
//! use facetsync::domain::SortKey;
//! use facetsync::query::decode;
//! use facetsync::Config;
//!
//! let mut session = FilterSession::new(&Config::default(), MemoryAddress::new("/catalog", ""), None);
//! session.start();
//!
//! session.dispatch(&Intent::SetSort(SortKey::PriceAscending));
//! session.dispatch(&Intent::SetPriceMin(Some(100.0)));
//! assert_eq!(session.address().href(), "/catalog?sort=priceAsc&priceMin=100");
//!
//! let restored = decode("?sort=priceAsc&priceMin=100", None);
//! assert_eq!(&restored, session.criteria());
//! ```

pub mod app;
pub mod domain;
pub mod fetch;
pub mod infrastructure;
pub mod query;
pub mod source;

pub mod observability;

pub use app::{FilterSession, Intent};
pub use domain::{FacetError, FetchError, FilterCriteria, Result};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default quiet window for substantive changes.
pub const DEFAULT_DEBOUNCE_MS: u64 = 450;

/// Default upper bound on a single data request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Engine configuration.
///
/// Loaded from a TOML file ([`Config::from_file`]) or a flat string map
/// ([`Config::from_map`]); missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet window applied to substantive criteria changes. Default: 450
    pub debounce_ms: u64,

    /// Prefetch the next page after a successful load. Default: `true`
    pub prefetch: bool,

    /// Requests running longer fail as transport errors. Default: 10000
    pub request_timeout_ms: u64,

    /// Tracing level for OpenTelemetry spans.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`, or any
    /// `EnvFilter` directive. `RUST_LOG` takes precedence. Default: `"info"`
    pub trace_level: Option<String>,

    /// Trace output file. Default: `facetsync-otlp.json` in the data directory
    pub trace_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            prefetch: true,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            trace_level: None,
            trace_file: None,
        }
    }
}

impl Config {
    /// Parses configuration from a flat string map.
    ///
    /// Unparseable or non-positive numbers fall back to their defaults, as do
    /// booleans other than `true`/`false`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use facetsync::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("debounce_ms".to_string(), "300".to_string());
    /// map.insert("prefetch".to_string(), "false".to_string());
    /// map.insert("request_timeout_ms".to_string(), "soon".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.debounce_ms, 300);
    /// assert!(!config.prefetch);
    /// assert_eq!(config.request_timeout_ms, 10_000);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let positive = |key: &str, default: u64| {
            map.get(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        let non_empty = |key: &str| {
            map.get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Self {
            debounce_ms: positive("debounce_ms", DEFAULT_DEBOUNCE_MS),
            prefetch: map
                .get("prefetch")
                .and_then(|s| s.trim().parse::<bool>().ok())
                .unwrap_or(true),
            request_timeout_ms: positive("request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS),
            trace_level: non_empty("trace_level"),
            trace_file: non_empty("trace_file"),
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// sets a non-positive duration.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| FacetError::Config(format!("failed to parse {}: {e}", path.display())))?;

        if config.debounce_ms == 0 {
            return Err(FacetError::Config("debounce_ms must be positive".to_string()));
        }
        if config.request_timeout_ms == 0 {
            return Err(FacetError::Config(
                "request_timeout_ms must be positive".to_string(),
            ));
        }

        tracing::debug!(path = ?path, "loaded configuration");
        Ok(config)
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Initializes tracing and returns the loaded configuration.
///
/// Reads `path` when given, otherwise `config.toml` in the data directory if
/// it exists, otherwise the defaults.
///
/// # Errors
///
/// Returns an error if an existing configuration file is invalid.
pub fn initialize(path: Option<&Path>) -> Result<Config> {
    let default_path = infrastructure::get_data_dir().join("config.toml");
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None if default_path.exists() => Config::from_file(&default_path)?,
        None => Config::default(),
    };

    observability::init_tracing(&config);
    tracing::debug!(
        debounce_ms = config.debounce_ms,
        prefetch = config.prefetch,
        "initialized facetsync"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.debounce(), Duration::from_millis(450));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.prefetch);
    }

    #[test]
    fn map_ignores_zero_and_blank_values() {
        let map = BTreeMap::from([
            ("debounce_ms".to_string(), "0".to_string()),
            ("trace_level".to_string(), "  ".to_string()),
            ("prefetch".to_string(), "maybe".to_string()),
        ]);
        let config = Config::from_map(&map);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debounce_ms = 200\ntrace_level = \"debug\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.trace_level.as_deref(), Some("debug"));
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn file_rejects_zero_timeout_and_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "request_timeout_ms = 0\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(FacetError::Config(_))));

        std::fs::write(&path, "debounce_ms = \"fast\"\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(FacetError::Config(_))));
    }
}

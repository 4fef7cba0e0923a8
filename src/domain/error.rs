//! Error types for the filter synchronization engine.
//!
//! Two families live here. [`FacetError`] covers the ambient failures of the
//! crate (configuration, catalog files, intent parsing). [`FetchError`] is the
//! data-layer taxonomy the fetch orchestrator surfaces to the user: a
//! superseded request is `Cancelled` and never shown, everything else carries
//! a message and, for server-reported failures, an optional status code.
//!
//! Query decoding has no error type at all: malformed input falls back to
//! defaults field by field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for engine setup and I/O.
///
/// # Examples
///
/// ```
/// use facetsync::FacetError;
///
/// fn validate_debounce(ms: u64) -> Result<(), FacetError> {
///     if ms == 0 {
///         return Err(FacetError::Config("debounce_ms must be positive".to_string()));
///     }
///     Ok(())
/// }
///
/// assert!(validate_debounce(0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum FacetError {
    /// Configuration is invalid or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog or category tree file could not be decoded.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A textual intent (CLI input) could not be understood.
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),
}

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, FacetError>;

/// Failure of a single data-layer request.
///
/// Only the fetch orchestrator decides what a failure means for the user;
/// lower layers just report it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    /// The request was superseded or aborted. Never user-visible.
    #[error("request cancelled")]
    Cancelled,

    /// Generic, retry-capable failure (network, timeout, decode).
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable description.
        message: String,
    },

    /// Failure reported by the server itself.
    #[error("{message}")]
    Application {
        /// Server-provided message, surfaced verbatim.
        message: String,
        /// HTTP-like status code, when the server sent one.
        status: Option<u16>,
    },
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Application {
            message: message.into(),
            status,
        }
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for display next to a retry affordance.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Cancelled => "request cancelled".to_string(),
            Self::Transport { message } | Self::Application { message, .. } => message.clone(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => *status,
            Self::Cancelled | Self::Transport { .. } => None,
        }
    }
}

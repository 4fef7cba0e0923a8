//! Orchestrator protocol: events in, commands out.
//!
//! The orchestrator never performs I/O. It consumes [`FetchEvent`]s and
//! returns [`FetchCommand`]s for a runtime to execute. Commands that leave
//! the orchestrator for asynchronous work carry the trace context that was
//! active when they were issued, so the spans of the eventual request link
//! back to the intent that caused it.

use crate::domain::{FetchError, FetchParams, Page};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Distributed tracing context carried across task boundaries.
///
/// Captures the current trace and span IDs from OpenTelemetry so a task
/// spawned later can parent its spans on the span that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking spans across tasks.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Creates a trace context from the current tracing span.
    ///
    /// Returns `None` if the current span context is invalid, which is the
    /// case whenever no OpenTelemetry layer is installed.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let span = tracing::Span::current();

        let otel_context = span.context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if span_context.is_valid() {
            let trace_id = format!("{:032x}", span_context.trace_id());
            let parent_span_id = format!("{:016x}", span_context.span_id());

            tracing::trace!(
                trace_id = %trace_id,
                parent_span_id = %parent_span_id,
                "capturing trace context"
            );

            Some(Self {
                trace_id,
                parent_span_id,
            })
        } else {
            None
        }
    }

    /// Rebuilds a remote OpenTelemetry context to parent spans on.
    ///
    /// Returns `None` if either ID is not valid hex.
    #[must_use]
    pub fn to_otel_context(&self) -> Option<opentelemetry::Context> {
        use opentelemetry::trace::{
            SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
        };

        let trace_id = TraceId::from_hex(&self.trace_id).ok()?;
        let span_id = SpanId::from_hex(&self.parent_span_id).ok()?;

        let span_context = SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );

        Some(opentelemetry::Context::current().with_remote_span_context(span_context))
    }
}

/// Inputs to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// The criteria projected onto a new request snapshot.
    CriteriaChanged(FetchParams),

    /// The quiet window identified by `token` ran out without being cancelled.
    DebounceElapsed {
        token: u64,
    },

    /// A fetch issued with `sequence` finished.
    Completed {
        sequence: u64,
        result: Result<Page, FetchError>,
    },

    /// Manual refetch of the current snapshot, bypassing the quiet window.
    Refetch {
        /// Evict the data layer's cached result for the snapshot first.
        invalidate: bool,
    },
}

/// Macro to generate builder methods for `FetchCommand` variants.
///
/// Generates convenience constructors that automatically attach the current
/// trace context to each command variant.
macro_rules! fetch_command_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl FetchCommand {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " command with current trace context")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

fetch_command_builders! {
    fetch(Fetch { sequence: u64, params: FetchParams }),
    prefetch(Prefetch { params: FetchParams }),
    invalidate(Invalidate { params: FetchParams }),
}

/// Side effects requested by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchCommand {
    /// Start a quiet window; report [`FetchEvent::DebounceElapsed`] when it ends.
    StartDebounce {
        token: u64,
        delay: Duration,
    },

    /// Cancel the quiet window identified by `token`.
    CancelDebounce {
        token: u64,
    },

    /// Request one page; report [`FetchEvent::Completed`] with `sequence`.
    Fetch {
        sequence: u64,
        params: FetchParams,

        /// Trace context for linking spans across tasks.
        trace_context: Option<TraceContext>,
    },

    /// Warm the data layer for `params`. Outcome is ignored.
    Prefetch {
        params: FetchParams,

        /// Trace context for linking spans across tasks.
        trace_context: Option<TraceContext>,
    },

    /// Evict any cached result for exactly `params`.
    Invalidate {
        params: FetchParams,

        /// Trace context for linking spans across tasks.
        trace_context: Option<TraceContext>,
    },
}

impl FetchCommand {
    /// Trace context attached to this command, if any.
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::Fetch { trace_context, .. }
            | Self::Prefetch { trace_context, .. }
            | Self::Invalidate { trace_context, .. } => trace_context.as_ref(),
            Self::StartDebounce { .. } | Self::CancelDebounce { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilterCriteria;

    #[test]
    fn builders_leave_context_empty_without_otel_layer() {
        let params = FetchParams::from_criteria(&FilterCriteria::default());
        let command = FetchCommand::fetch(1, params.clone());
        assert_eq!(
            command,
            FetchCommand::Fetch {
                sequence: 1,
                params,
                trace_context: None,
            }
        );
        assert!(command.trace_context().is_none());
    }

    #[test]
    fn malformed_ids_produce_no_context() {
        let context = TraceContext {
            trace_id: "not-hex".to_string(),
            parent_span_id: "0000000000000001".to_string(),
        };
        assert!(context.to_otel_context().is_none());
    }

    #[test]
    fn valid_ids_produce_remote_context() {
        use opentelemetry::trace::TraceContextExt;

        let context = TraceContext {
            trace_id: "0af7651916cd43dd8448eb211c80319c".to_string(),
            parent_span_id: "b7ad6b7169203331".to_string(),
        };
        let otel = context.to_otel_context().expect("valid hex ids");
        assert!(otel.span().span_context().is_remote());
    }
}

//! Tokio runtime driver for a [`FilterSession`].
//!
//! The session and its orchestrator are synchronous and never touch I/O.
//! [`Runtime`] executes the [`FetchCommand`]s they produce:
//!
//! - `StartDebounce` / `CancelDebounce` → [`Timer`] start / cancel
//! - `Fetch` → spawned task, bounded by the request timeout, whose outcome
//!   comes back as a [`FetchEvent::Completed`]
//! - `Prefetch` → spawned task, outcome ignored
//! - `Invalidate` → synchronous call into the data source
//!
//! Timers and tasks report back over an unbounded channel. All session
//! mutation happens on the task that owns the `Runtime`, one event at a
//! time, so intents and completions never interleave.

use super::messages::{FetchCommand, FetchEvent, TraceContext};
use super::timer::{Timer, TimerHandle, TokioTimer};
use crate::app::{Address, FilterSession, Intent};
use crate::domain::{CategoryTree, FetchError};
use crate::source::DataSource;
use crate::Config;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Drives a session against a data source.
pub struct Runtime<S, A, T = TokioTimer>
where
    S: DataSource + ?Sized + 'static,
    A: Address,
    T: Timer,
{
    session: FilterSession<A>,
    source: Arc<S>,
    timer: T,
    debounce_timers: HashMap<u64, TimerHandle>,
    request_timeout: Duration,
    events_tx: mpsc::UnboundedSender<FetchEvent>,
    events_rx: mpsc::UnboundedReceiver<FetchEvent>,
}

impl<S, A> Runtime<S, A, TokioTimer>
where
    S: DataSource + ?Sized + 'static,
    A: Address,
{
    /// Creates a runtime with tokio-backed debounce timers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(session: FilterSession<A>, source: Arc<S>, config: &Config) -> Self {
        Self::with_timer(session, source, TokioTimer::new(), config)
    }
}

impl<S, A, T> Runtime<S, A, T>
where
    S: DataSource + ?Sized + 'static,
    A: Address,
    T: Timer,
{
    pub fn with_timer(session: FilterSession<A>, source: Arc<S>, timer: T, config: &Config) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session,
            source,
            timer,
            debounce_timers: HashMap::new(),
            request_timeout: config.request_timeout(),
            events_tx,
            events_rx,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &FilterSession<A> {
        &self.session
    }

    #[must_use]
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    /// Starts the session; the initial fetch is issued immediately.
    pub fn start(&mut self) {
        let commands = self.session.start();
        self.execute(commands);
    }

    pub fn dispatch(&mut self, intent: &Intent) {
        let commands = self.session.dispatch(intent);
        self.execute(commands);
    }

    pub fn refetch(&mut self, invalidate: bool) {
        let commands = self.session.refetch(invalidate);
        self.execute(commands);
    }

    pub fn set_category_tree(&mut self, tree: Arc<CategoryTree>) {
        let commands = self.session.set_category_tree(tree);
        self.execute(commands);
    }

    /// Waits for the next timer or completion event and applies it.
    ///
    /// Returns `false` if the event channel closed.
    pub async fn process_next(&mut self) -> bool {
        let Some(event) = self.events_rx.recv().await else {
            return false;
        };

        if let FetchEvent::DebounceElapsed { token } = &event {
            self.debounce_timers.remove(token);
        }
        let commands = self.session.handle_fetch_event(event);
        self.execute(commands);
        true
    }

    /// Processes events until no quiet window is running and the latest
    /// fetch has been admitted.
    pub async fn settle(&mut self) {
        while !self.session.orchestrator().is_quiescent() {
            if !self.process_next().await {
                break;
            }
        }
    }

    fn execute(&mut self, commands: Vec<FetchCommand>) {
        for command in commands {
            match command {
                FetchCommand::StartDebounce { token, delay } => {
                    let events = self.events_tx.clone();
                    let handle = self.timer.start(
                        delay,
                        Box::new(move || {
                            let _ = events.send(FetchEvent::DebounceElapsed { token });
                        }),
                    );
                    self.debounce_timers.insert(token, handle);
                }
                FetchCommand::CancelDebounce { token } => {
                    if let Some(handle) = self.debounce_timers.remove(&token) {
                        self.timer.cancel(handle);
                    }
                }
                FetchCommand::Fetch {
                    sequence,
                    params,
                    trace_context,
                } => {
                    let span = tracing::debug_span!("fetch_request", sequence, page = params.page);
                    attach_parent(&span, trace_context.as_ref());

                    let source = Arc::clone(&self.source);
                    let events = self.events_tx.clone();
                    let timeout = self.request_timeout;
                    tokio::spawn(
                        async move {
                            let result = match tokio::time::timeout(timeout, source.fetch(&params)).await {
                                Ok(result) => result,
                                Err(_) => {
                                    tracing::debug!(timeout_ms = %timeout.as_millis(), "request timed out");
                                    Err(FetchError::transport(format!(
                                        "request timed out after {}ms",
                                        timeout.as_millis()
                                    )))
                                }
                            };
                            let _ = events.send(FetchEvent::Completed { sequence, result });
                        }
                        .instrument(span),
                    );
                }
                FetchCommand::Prefetch {
                    params,
                    trace_context,
                } => {
                    let span = tracing::debug_span!("prefetch_request", page = params.page);
                    attach_parent(&span, trace_context.as_ref());

                    let source = Arc::clone(&self.source);
                    let timeout = self.request_timeout;
                    tokio::spawn(
                        async move {
                            match tokio::time::timeout(timeout, source.prefetch(&params)).await {
                                Ok(Ok(())) => tracing::debug!("prefetch complete"),
                                Ok(Err(error)) => tracing::debug!(error = %error, "prefetch failed, ignoring"),
                                Err(_) => tracing::debug!("prefetch timed out, ignoring"),
                            }
                        }
                        .instrument(span),
                    );
                }
                FetchCommand::Invalidate {
                    params,
                    trace_context,
                } => {
                    let span = tracing::debug_span!("invalidate", page = params.page);
                    attach_parent(&span, trace_context.as_ref());
                    let _guard = span.enter();
                    self.source.invalidate(&params);
                }
            }
        }
    }
}

/// Parents `span` on the context captured when the command was issued.
fn attach_parent(span: &tracing::Span, trace_context: Option<&TraceContext>) {
    if let Some(parent) = trace_context.and_then(TraceContext::to_otel_context) {
        span.set_parent(parent);
    }
}

//! Fetch scheduling: debounce, latest-wins admission, prefetch and refetch.
//!
//! The orchestrator is a pure state machine; the runtime executes its
//! commands on tokio.
//!
//! # Modules
//!
//! - `snapshot`: Classifies consecutive request snapshots
//! - `messages`: Event/command protocol with trace context propagation
//! - `orchestrator`: The state machine and the user-visible [`FetchView`]
//! - `timer`: Cancellable timer abstraction and its tokio implementation
//! - `runtime`: Executes commands against a [`DataSource`](crate::source::DataSource)

pub mod messages;
pub mod orchestrator;
pub mod runtime;
pub mod snapshot;
pub mod timer;

pub use messages::{FetchCommand, FetchEvent, TraceContext};
pub use orchestrator::{FetchOrchestrator, FetchPhase, FetchView, LoadStatus, DEFAULT_DEBOUNCE};
pub use runtime::Runtime;
pub use snapshot::ChangeKind;
pub use timer::{Timer, TimerHandle, TimerTask, TokioTimer};

//! Fetch orchestration state machine.
//!
//! [`FetchOrchestrator`] decides *when* to request data and *which* response
//! becomes visible. It is a pure state machine: [`FetchOrchestrator::handle`]
//! takes a [`FetchEvent`], mutates internal state, and returns the
//! [`FetchCommand`]s a runtime must execute.
//!
//! # Phases
//!
//! ```text
//!            substantive change            quiet window ends
//!   Idle ───────────────────────▶ Debouncing ──────────────▶ InFlight(n)
//!     │                             ▲   │                       │
//!     │ first observation /         └───┘ substantive change    │ response n
//!     │ pagination-only change            restarts the window   ▼
//!     └──────────────────────────────────────────────────▶   Settled
//! ```
//!
//! # Admission
//!
//! Every fetch gets a strictly increasing sequence number. A completion is
//! admitted only if its sequence equals the highest one issued so far, so a
//! late response from a superseded request can never overwrite newer state,
//! whatever order responses arrive in.

use super::messages::{FetchCommand, FetchEvent};
use super::snapshot::ChangeKind;
use crate::domain::{FetchError, FetchParams, Page};
use std::time::Duration;

/// Quiet window applied to substantive changes unless configured otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(450);

/// Loading indicator state of the visible results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// First load in progress; no results to show.
    Loading,
    /// Results are shown while a newer request is in progress.
    Refreshing,
    /// The latest admitted response is shown.
    Ready,
    /// The first load failed; there is nothing to show.
    Failed,
}

/// What the user sees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchView {
    /// Last successfully admitted page.
    ///
    /// Kept across failed refreshes so stale results stay visible.
    pub results: Option<Page>,

    /// Current loading indicator.
    pub status: LoadStatus,

    /// Error from the latest admitted failure.
    ///
    /// With `results` present this is a background-refresh failure and the
    /// caller should offer a retry; without results, `status` is
    /// [`LoadStatus::Failed`]. Cleared by any later admitted response,
    /// including a cancellation.
    pub error: Option<FetchError>,
}

impl FetchView {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.status, LoadStatus::Loading | LoadStatus::Refreshing)
    }
}

/// Scheduling phase of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Debouncing,
    InFlight(u64),
    Settled,
}

/// Debounced, latest-wins fetch scheduler.
#[derive(Debug)]
pub struct FetchOrchestrator {
    debounce: Duration,
    prefetch: bool,
    last_params: Option<FetchParams>,
    pending_debounce: Option<u64>,
    next_token: u64,
    latest_sequence: u64,
    in_flight_params: Option<FetchParams>,
    phase: FetchPhase,
    view: FetchView,
}

impl Default for FetchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, true)
    }
}

impl FetchOrchestrator {
    /// Creates an orchestrator with the given quiet window.
    ///
    /// # Parameters
    ///
    /// * `debounce` - Quiet window for substantive changes
    /// * `prefetch` - Whether to warm the next page after a successful load
    #[must_use]
    pub const fn new(debounce: Duration, prefetch: bool) -> Self {
        Self {
            debounce,
            prefetch,
            last_params: None,
            pending_debounce: None,
            next_token: 0,
            latest_sequence: 0,
            in_flight_params: None,
            phase: FetchPhase::Idle,
            view: FetchView {
                results: None,
                status: LoadStatus::Idle,
                error: None,
            },
        }
    }

    #[must_use]
    pub const fn view(&self) -> &FetchView {
        &self.view
    }

    #[must_use]
    pub const fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// Highest sequence number issued so far; 0 before the first fetch.
    #[must_use]
    pub const fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    /// Last observed request snapshot.
    #[must_use]
    pub const fn last_params(&self) -> Option<&FetchParams> {
        self.last_params.as_ref()
    }

    /// Returns `true` when no quiet window is running and no admitted
    /// response is outstanding.
    #[must_use]
    pub const fn is_quiescent(&self) -> bool {
        !matches!(self.phase, FetchPhase::Debouncing | FetchPhase::InFlight(_))
    }

    /// Processes one event and returns the commands to execute, in order.
    pub fn handle(&mut self, event: FetchEvent) -> Vec<FetchCommand> {
        let span = tracing::debug_span!("orchestrator_handle", event = event_name(&event));
        let _guard = span.entered();

        match event {
            FetchEvent::CriteriaChanged(params) => self.observe(params),
            FetchEvent::DebounceElapsed { token } => self.debounce_elapsed(token),
            FetchEvent::Completed { sequence, result } => self.complete(sequence, result),
            FetchEvent::Refetch { invalidate } => self.refetch(invalidate),
        }
    }

    fn observe(&mut self, params: FetchParams) -> Vec<FetchCommand> {
        let kind = ChangeKind::classify(self.last_params.as_ref(), &params);
        tracing::debug!(kind = ?kind, page = params.page, "criteria observed");

        if kind == ChangeKind::Unchanged {
            return Vec::new();
        }
        self.last_params = Some(params.clone());

        let mut commands = self.cancel_pending_debounce();
        if kind.is_debounced() {
            let token = self.next_token;
            self.next_token += 1;
            self.pending_debounce = Some(token);
            self.phase = FetchPhase::Debouncing;
            commands.push(FetchCommand::StartDebounce {
                token,
                delay: self.debounce,
            });
        } else {
            commands.push(self.issue_fetch(params));
        }
        commands
    }

    fn debounce_elapsed(&mut self, token: u64) -> Vec<FetchCommand> {
        if self.pending_debounce != Some(token) {
            tracing::debug!(token, "ignoring stale debounce");
            return Vec::new();
        }
        self.pending_debounce = None;

        match self.last_params.clone() {
            Some(params) => vec![self.issue_fetch(params)],
            None => Vec::new(),
        }
    }

    fn complete(&mut self, sequence: u64, result: Result<Page, FetchError>) -> Vec<FetchCommand> {
        if sequence != self.latest_sequence {
            tracing::debug!(
                sequence,
                latest = self.latest_sequence,
                "discarding superseded response"
            );
            return Vec::new();
        }

        self.phase = if self.pending_debounce.is_some() {
            FetchPhase::Debouncing
        } else {
            FetchPhase::Settled
        };
        let params = self.in_flight_params.take();

        match result {
            Ok(page) => {
                tracing::debug!(
                    sequence,
                    items = page.data.len(),
                    has_next = page.meta.has_next,
                    "response admitted"
                );
                let next_page = (self.prefetch && page.meta.has_next)
                    .then(|| page.meta.page.saturating_add(1));

                self.view.results = Some(page);
                self.view.status = LoadStatus::Ready;
                self.view.error = None;

                match (next_page, params) {
                    (Some(next_page), Some(params)) => {
                        vec![FetchCommand::prefetch(params.with_page(next_page))]
                    }
                    _ => Vec::new(),
                }
            }
            Err(FetchError::Cancelled) => {
                tracing::debug!(sequence, "request cancelled");
                self.view.status = if self.view.results.is_some() {
                    LoadStatus::Ready
                } else {
                    LoadStatus::Idle
                };
                self.view.error = None;
                Vec::new()
            }
            Err(error) => {
                tracing::warn!(sequence, error = %error, "fetch failed");
                self.view.status = if self.view.results.is_some() {
                    LoadStatus::Ready
                } else {
                    LoadStatus::Failed
                };
                self.view.error = Some(error);
                Vec::new()
            }
        }
    }

    fn refetch(&mut self, invalidate: bool) -> Vec<FetchCommand> {
        let Some(params) = self.last_params.clone() else {
            tracing::debug!("refetch before first observation ignored");
            return Vec::new();
        };

        let mut commands = self.cancel_pending_debounce();
        if invalidate {
            commands.push(FetchCommand::invalidate(params.clone()));
        }
        commands.push(self.issue_fetch(params));
        commands
    }

    fn cancel_pending_debounce(&mut self) -> Vec<FetchCommand> {
        self.pending_debounce
            .take()
            .map(|token| FetchCommand::CancelDebounce { token })
            .into_iter()
            .collect()
    }

    fn issue_fetch(&mut self, params: FetchParams) -> FetchCommand {
        self.latest_sequence += 1;
        let sequence = self.latest_sequence;

        self.phase = FetchPhase::InFlight(sequence);
        self.view.status = if self.view.results.is_some() {
            LoadStatus::Refreshing
        } else {
            LoadStatus::Loading
        };
        self.in_flight_params = Some(params.clone());

        tracing::debug!(sequence, page = params.page, "issuing fetch");
        FetchCommand::fetch(sequence, params)
    }
}

const fn event_name(event: &FetchEvent) -> &'static str {
    match event {
        FetchEvent::CriteriaChanged(_) => "criteria_changed",
        FetchEvent::DebounceElapsed { .. } => "debounce_elapsed",
        FetchEvent::Completed { .. } => "completed",
        FetchEvent::Refetch { .. } => "refetch",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterCriteria, PageMeta, SortKey};

    fn params(criteria: &FilterCriteria) -> FetchParams {
        FetchParams::from_criteria(criteria)
    }

    fn sorted(sort: SortKey) -> FetchParams {
        params(&FilterCriteria {
            sort,
            ..FilterCriteria::default()
        })
    }

    fn paged(page: u32) -> FetchParams {
        params(&FilterCriteria {
            page,
            ..FilterCriteria::default()
        })
    }

    fn page(number: u32, has_next: bool) -> Page {
        Page {
            data: Vec::new(),
            meta: PageMeta {
                total: 100,
                filtered: 100,
                page: number,
                page_size: 20,
                total_pages: 5,
                has_next,
                has_prev: number > 1,
            },
        }
    }

    fn fetched_sequence(commands: &[FetchCommand]) -> Option<u64> {
        commands.iter().find_map(|command| match command {
            FetchCommand::Fetch { sequence, .. } => Some(*sequence),
            _ => None,
        })
    }

    fn started_token(commands: &[FetchCommand]) -> Option<u64> {
        commands.iter().find_map(|command| match command {
            FetchCommand::StartDebounce { token, .. } => Some(*token),
            _ => None,
        })
    }

    fn no_prefetch() -> FetchOrchestrator {
        FetchOrchestrator::new(DEFAULT_DEBOUNCE, false)
    }

    #[test]
    fn first_observation_fetches_immediately() {
        let mut orchestrator = no_prefetch();
        let commands = orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));

        assert_eq!(fetched_sequence(&commands), Some(1));
        assert_eq!(orchestrator.phase(), FetchPhase::InFlight(1));
        assert_eq!(orchestrator.view().status, LoadStatus::Loading);
    }

    #[test]
    fn pagination_fetches_without_waiting() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));

        let commands = orchestrator.handle(FetchEvent::CriteriaChanged(paged(2)));
        assert_eq!(fetched_sequence(&commands), Some(2));
        assert_eq!(started_token(&commands), None);
    }

    #[test]
    fn sort_change_waits_for_quiet_window() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));

        let commands = orchestrator.handle(FetchEvent::CriteriaChanged(sorted(SortKey::Popular)));
        assert_eq!(fetched_sequence(&commands), None);
        assert_eq!(
            commands,
            vec![FetchCommand::StartDebounce {
                token: 0,
                delay: DEFAULT_DEBOUNCE
            }]
        );
        assert_eq!(orchestrator.phase(), FetchPhase::Debouncing);

        let commands = orchestrator.handle(FetchEvent::DebounceElapsed { token: 0 });
        assert_eq!(fetched_sequence(&commands), Some(2));
    }

    #[test]
    fn further_substantive_change_restarts_window() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::CriteriaChanged(sorted(SortKey::Popular)));

        let commands =
            orchestrator.handle(FetchEvent::CriteriaChanged(sorted(SortKey::PriceAscending)));
        assert_eq!(commands[0], FetchCommand::CancelDebounce { token: 0 });
        assert_eq!(started_token(&commands), Some(1));

        assert!(orchestrator
            .handle(FetchEvent::DebounceElapsed { token: 0 })
            .is_empty());

        let commands = orchestrator.handle(FetchEvent::DebounceElapsed { token: 1 });
        match commands.as_slice() {
            [FetchCommand::Fetch { params, .. }] => {
                assert_eq!(params.sort, Some(SortKey::PriceAscending));
            }
            other => panic!("expected a single fetch, got {other:?}"),
        }
    }

    #[test]
    fn pagination_during_window_fetches_latest_and_cancels_window() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::CriteriaChanged(sorted(SortKey::Popular)));

        let popular_page_two = params(&FilterCriteria {
            sort: SortKey::Popular,
            page: 2,
            ..FilterCriteria::default()
        });
        let commands = orchestrator.handle(FetchEvent::CriteriaChanged(popular_page_two.clone()));
        assert_eq!(commands[0], FetchCommand::CancelDebounce { token: 0 });
        assert!(matches!(
            &commands[1],
            FetchCommand::Fetch { params, .. } if *params == popular_page_two
        ));
    }

    #[test]
    fn unchanged_snapshot_is_ignored() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        assert!(orchestrator
            .handle(FetchEvent::CriteriaChanged(paged(1)))
            .is_empty());
        assert_eq!(orchestrator.latest_sequence(), 1);
    }

    #[test]
    fn late_response_from_older_request_is_discarded() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(2)));

        orchestrator.handle(FetchEvent::Completed {
            sequence: 2,
            result: Ok(page(2, true)),
        });
        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Ok(page(1, true)),
        });

        let view = orchestrator.view();
        assert_eq!(view.results.as_ref().map(|p| p.meta.page), Some(2));
        assert_eq!(view.status, LoadStatus::Ready);
    }

    #[test]
    fn older_response_never_lands_while_newer_is_pending() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(2)));

        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Ok(page(1, true)),
        });
        assert!(orchestrator.view().results.is_none());
        assert_eq!(orchestrator.phase(), FetchPhase::InFlight(2));
    }

    #[test]
    fn refresh_keeps_results_and_flags_refreshing() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Ok(page(1, true)),
        });

        orchestrator.handle(FetchEvent::CriteriaChanged(paged(2)));
        assert_eq!(orchestrator.view().status, LoadStatus::Refreshing);
        assert!(orchestrator.view().results.is_some());
    }

    #[test]
    fn refresh_failure_keeps_stale_results_with_error() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Ok(page(1, true)),
        });
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(2)));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 2,
            result: Err(FetchError::application("out of stock index", Some(503))),
        });

        let view = orchestrator.view();
        assert_eq!(view.status, LoadStatus::Ready);
        assert_eq!(view.results.as_ref().map(|p| p.meta.page), Some(1));
        assert_eq!(view.error.as_ref().and_then(FetchError::status), Some(503));
    }

    #[test]
    fn initial_failure_is_explicit() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Err(FetchError::transport("connection reset")),
        });

        let view = orchestrator.view();
        assert_eq!(view.status, LoadStatus::Failed);
        assert!(view.results.is_none());
        assert_eq!(view.error.as_ref().map(FetchError::message).as_deref(), Some("connection reset"));
    }

    #[test]
    fn cancellation_is_not_surfaced() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Err(FetchError::Cancelled),
        });

        assert_eq!(orchestrator.view().status, LoadStatus::Idle);
        assert!(orchestrator.view().error.is_none());
        assert!(orchestrator.is_quiescent());
    }

    #[test]
    fn cancelled_retry_clears_earlier_failure() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Err(FetchError::transport("boom")),
        });
        assert!(orchestrator.view().error.is_some());

        let commands = orchestrator.handle(FetchEvent::CriteriaChanged(paged(2)));
        assert_eq!(fetched_sequence(&commands), Some(2));
        orchestrator.handle(FetchEvent::Completed {
            sequence: 2,
            result: Err(FetchError::Cancelled),
        });

        let view = orchestrator.view();
        assert_eq!(view.status, LoadStatus::Idle);
        assert!(view.error.is_none());
        assert!(view.results.is_none());
    }

    #[test]
    fn success_with_next_page_prefetches_it() {
        let mut orchestrator = FetchOrchestrator::default();
        let base = sorted(SortKey::Popular);
        orchestrator.handle(FetchEvent::CriteriaChanged(base.clone()));

        let commands = orchestrator.handle(FetchEvent::Completed {
            sequence: 1,
            result: Ok(page(1, true)),
        });
        assert_eq!(
            commands,
            vec![FetchCommand::Prefetch {
                params: base.with_page(2),
                trace_context: None,
            }]
        );

        orchestrator.handle(FetchEvent::CriteriaChanged(base.with_page(5)));
        let commands = orchestrator.handle(FetchEvent::Completed {
            sequence: 2,
            result: Ok(page(5, false)),
        });
        assert!(commands.is_empty());
    }

    #[test]
    fn refetch_bypasses_window_and_invalidates_first() {
        let mut orchestrator = no_prefetch();
        orchestrator.handle(FetchEvent::CriteriaChanged(paged(1)));
        orchestrator.handle(FetchEvent::CriteriaChanged(sorted(SortKey::Popular)));

        let commands = orchestrator.handle(FetchEvent::Refetch { invalidate: true });
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], FetchCommand::CancelDebounce { token: 0 });
        assert!(matches!(&commands[1], FetchCommand::Invalidate { params, .. } if params.sort == Some(SortKey::Popular)));
        assert_eq!(fetched_sequence(&commands), Some(2));
    }

    #[test]
    fn refetch_before_any_observation_does_nothing() {
        let mut orchestrator = no_prefetch();
        assert!(orchestrator
            .handle(FetchEvent::Refetch { invalidate: true })
            .is_empty());
    }
}

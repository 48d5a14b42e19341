//! Moderation Store: pending draft jobs, run history, the selection working
//! set, and the bulk operation orchestrator.
//!
//! State lives behind a mutex that is never held across an await, so
//! overlapping operations interleave freely and each handler writes its own
//! slice of state. The collections cannot be corrupted by that interleaving,
//! but ordering is last-response-wins: a fetch that resolves after a later
//! optimistic removal overwrites it. Callers needing strict ordering
//! serialize fetch-after-write. In-flight requests are never cancelled.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::api::ScrapingApi;
use super::selection::SelectionSet;
use crate::errors::ApiError;
use crate::models::job::{DraftJob, ScrapeRun, ScrapeSource};

/// Interim status line shown while a trigger request is in flight.
const TRIGGER_PENDING_STATUS: &str = "Requesting scraping...";

/// Which terminal transition a batch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Approve,
    Reject,
}

/// The store's observable state. `snapshot` hands out a clone.
#[derive(Debug, Default, Clone)]
pub struct ModerationState {
    /// Draft jobs awaiting a terminal transition. Replaced wholesale on
    /// every successful fetch; last response wins.
    pub pending: Vec<DraftJob>,
    /// Scrape run history as last fetched. Append-only server-side.
    pub history: Vec<ScrapeRun>,
    pub selection: SelectionSet,
    /// Raised when an operation starts and lowered when that operation
    /// settles. Overlapping operations can race it low/high; the
    /// collections are unaffected by that race.
    pub loading: bool,
    /// Human-readable trigger status from the backend.
    pub status: Option<String>,
    /// Latest operation failure, kept until cleared.
    pub last_error: Option<String>,
}

pub struct ModerationStore<A> {
    api: A,
    state: Mutex<ModerationState>,
}

impl<A: ScrapingApi> ModerationStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(ModerationState::default()),
        }
    }

    pub fn snapshot(&self) -> ModerationState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ModerationState> {
        self.state.lock().expect("moderation state poisoned")
    }

    // Selection controller surface.

    /// Adds the id to the selection if absent, removes it if present. Hook
    /// for a stateful shell with per-row checkboxes; the CLI passes explicit
    /// id lists instead.
    #[allow(dead_code)]
    pub fn toggle_selected(&self, id: &str) {
        self.lock().selection.toggle(id);
    }

    /// Selects every currently loaded pending job.
    pub fn select_all(&self) {
        let mut state = self.lock();
        let state = &mut *state;
        state.selection.select_all(&state.pending);
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.lock().selection.ids()
    }

    /// True iff every currently loaded pending job is selected. Re-derived
    /// from the collection on every call.
    pub fn is_all_selected(&self) -> bool {
        let state = self.lock();
        state.selection.is_all_selected(&state.pending)
    }

    // Moderation operations.

    /// Starts a server-side scrape for one source (or all of them) and
    /// stores the backend's status message for display. Fire-and-forget with
    /// respect to the pending collection: a later explicit fetch picks up
    /// whatever the run inserts.
    pub async fn trigger_scrape(&self, source: ScrapeSource) -> Result<String, ApiError> {
        {
            let mut state = self.lock();
            state.loading = true;
            state.status = Some(TRIGGER_PENDING_STATUS.to_string());
        }

        match self.api.trigger(source).await {
            Ok(receipt) => {
                debug!(source = source.as_str(), "scrape run requested");
                let mut state = self.lock();
                state.loading = false;
                state.status = Some(receipt.message.clone());
                Ok(receipt.message)
            }
            Err(err) => Err(self.settle_failure(err)),
        }
    }

    /// Replaces the pending collection with the server's current snapshot
    /// and truncates the selection to surviving ids.
    pub async fn fetch_pending(&self) -> Result<(), ApiError> {
        self.lock().loading = true;

        match self.api.pending_jobs().await {
            Ok(jobs) => {
                debug!(count = jobs.len(), "pending jobs fetched");
                let mut state = self.lock();
                state.loading = false;
                state.pending = jobs;
                let state = &mut *state;
                state.selection.retain_valid(&state.pending);
                Ok(())
            }
            Err(err) => Err(self.settle_failure(err)),
        }
    }

    /// Replaces the run history wholesale. Does not touch `loading`.
    pub async fn fetch_history(&self) -> Result<(), ApiError> {
        match self.api.history().await {
            Ok(runs) => {
                self.lock().history = runs;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "history fetch failed");
                self.lock().last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Approves one draft job, publishing it. On success the item leaves the
    /// pending collection immediately; no refresh is required.
    pub async fn approve(&self, id: &str) -> Result<(), ApiError> {
        let outcome = self.api.approve(id).await;
        self.settle_transition(id, outcome)
    }

    /// Rejects one draft job, deleting it permanently.
    pub async fn reject(&self, id: &str) -> Result<(), ApiError> {
        let outcome = self.api.reject(id).await;
        self.settle_transition(id, outcome)
    }

    fn settle_transition(&self, id: &str, outcome: Result<(), ApiError>) -> Result<(), ApiError> {
        match outcome {
            Ok(()) => {
                self.remove_pending(id);
                Ok(())
            }
            // The job is already terminal (another operator, an overlapping
            // call). Idempotent success: the item just leaves the local set.
            Err(ApiError::RequestFailed { status: 404, .. }) => {
                debug!(id, "job already settled server-side");
                self.remove_pending(id);
                Ok(())
            }
            Err(err) => {
                warn!(id, error = %err, "transition failed; job left in place");
                self.lock().last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn remove_pending(&self, id: &str) {
        let mut state = self.lock();
        state.pending.retain(|job| job.id != id);
        state.selection.remove(id);
    }

    /// Approves every listed draft job in one batch. See [`Self::bulk`].
    pub async fn bulk_approve(&self, ids: &[String]) -> Result<(), ApiError> {
        self.bulk(BulkAction::Approve, ids).await
    }

    /// Rejects every listed draft job in one batch. See [`Self::bulk`].
    pub async fn bulk_reject(&self, ids: &[String]) -> Result<(), ApiError> {
        self.bulk(BulkAction::Reject, ids).await
    }

    /// Runs the batch over the current selection.
    pub async fn apply_to_selection(&self, action: BulkAction) -> Result<(), ApiError> {
        let ids = self.selected_ids();
        self.bulk(action, &ids).await
    }

    /// One batch request for the whole id list; all-or-nothing from this
    /// side. On success the selection is cleared and the pending collection
    /// re-derived from a fresh fetch; the batch response is never trusted as
    /// the new list, so a partially applied batch cannot cause drift. On
    /// failure both the selection and the collection stay exactly as they
    /// were, ready for a retry.
    async fn bulk(&self, action: BulkAction, ids: &[String]) -> Result<(), ApiError> {
        if ids.is_empty() {
            return Err(ApiError::EmptySelection);
        }

        self.lock().loading = true;

        let outcome = match action {
            BulkAction::Approve => self.api.bulk_approve(ids).await,
            BulkAction::Reject => self.api.bulk_reject(ids).await,
        };

        match outcome {
            Ok(()) => {
                debug!(count = ids.len(), ?action, "batch applied");
                {
                    let mut state = self.lock();
                    state.loading = false;
                    state.selection.clear();
                }
                self.fetch_pending().await
            }
            Err(err) => Err(self.settle_failure(err)),
        }
    }

    /// Clears the displayed status message and the latest error. Hook for a
    /// stateful shell dismissing its notice banner.
    #[allow(dead_code)]
    pub fn clear_status(&self) {
        let mut state = self.lock();
        state.status = None;
        state.last_error = None;
    }

    fn settle_failure(&self, err: ApiError) -> ApiError {
        warn!(error = %err, "moderation operation failed");
        let mut state = self.lock();
        state.loading = false;
        state.last_error = Some(err.to_string());
        err
    }
}

//! Observable poller state.
//!
//! The store is owned by the poller and handed to views by reference; views
//! read snapshots or subscribe to changes.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::models::{ProjectData, Task};
use crate::progress::ProgressView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    /// A job submission is in flight.
    Submitting,
    Polling,
    /// Status requests kept failing; the task may still be running.
    Stalled,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PollerState {
    /// Empty when no task is tracked.
    pub task_id: String,
    pub task: Option<Task>,
    pub progress: ProgressView,
    pub phase: Phase,
    pub last_error: Option<String>,
    pub project: Option<ProjectData>,
}

impl PollerState {
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Submitting | Phase::Polling)
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<PollerState>>,
}

impl Store {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PollerState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PollerState {
        self.tx.borrow().clone()
    }

    pub fn task_id(&self) -> String {
        self.tx.borrow().task_id.clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut PollerState)) {
        self.tx.send_modify(f);
    }

    /// Claims the store for a new task unless one is already being submitted
    /// or polled. Returns `None` when busy.
    ///
    /// Dropping the reservation before it is committed or aborted puts the
    /// store back to `Idle` with `submission cancelled` as the last error.
    pub fn reserve(&self) -> Option<Reservation<'_>> {
        let claimed = self.tx.send_if_modified(|s| {
            if s.is_busy() {
                return false;
            }
            s.task_id.clear();
            s.task = None;
            s.progress = ProgressView::default();
            s.phase = Phase::Submitting;
            s.last_error = None;
            true
        });
        claimed.then(|| Reservation { store: self, armed: true })
    }

    /// Starts tracking `task_id`.
    pub fn begin(&self, task_id: &str) {
        self.tx.send_modify(|s| {
            s.task_id = task_id.to_string();
            s.phase = Phase::Polling;
        });
    }

    /// Releases a reservation that never produced a task.
    pub fn abort(&self, error: &str) {
        self.tx.send_modify(|s| {
            s.phase = Phase::Idle;
            s.last_error = Some(error.to_string());
        });
    }

    /// Clears the tracked id, but only if it is still `task_id`.
    pub fn clear_task_id(&self, task_id: &str) -> bool {
        self.tx.send_if_modified(|s| {
            if s.task_id != task_id || s.task_id.is_empty() {
                return false;
            }
            s.task_id.clear();
            true
        })
    }
}

/// Exclusive claim on a [`Store`] while a job is being submitted.
#[must_use]
pub struct Reservation<'a> {
    store: &'a Store,
    armed: bool,
}

impl Reservation<'_> {
    /// Hands the store over to the poll loop for `task_id`.
    pub fn commit(mut self, task_id: &str) {
        self.armed = false;
        self.store.begin(task_id);
    }

    /// Gives the store back without a task.
    pub fn abort(mut self, error: &str) {
        self.armed = false;
        self.store.abort(error);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.abort("submission cancelled");
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_rejects_second_task() {
        let store = Store::new();
        let first = store.reserve().unwrap();
        assert!(store.reserve().is_none());
        first.commit("a");
        assert!(store.reserve().is_none());
        assert_eq!(store.task_id(), "a");

        store.update(|s| s.phase = Phase::Stalled);
        let again = store.reserve().unwrap();
        assert_eq!(store.snapshot().phase, Phase::Submitting);
        assert_eq!(store.task_id(), "");
        again.commit("b");
        assert_eq!(store.snapshot().phase, Phase::Polling);
    }

    #[test]
    fn test_dropped_reservation_frees_the_store() {
        let store = Store::new();
        {
            let _pending = store.reserve().unwrap();
            assert_eq!(store.snapshot().phase, Phase::Submitting);
        }
        let state = store.snapshot();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.last_error.as_deref(), Some("submission cancelled"));
        assert!(store.reserve().is_some());
    }

    #[test]
    fn test_abort_records_error() {
        let store = Store::new();
        store.reserve().unwrap().abort("connection refused");
        let state = store.snapshot();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_clear_only_matching_id() {
        let store = Store::new();
        store.begin("a");
        assert!(!store.clear_task_id("other"));
        assert!(store.clear_task_id("a"));
        assert_eq!(store.task_id(), "");
        assert!(!store.clear_task_id("a"));
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = Store::new();
        let mut rx = store.subscribe();
        store.update(|s| s.last_error = Some("x".into()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().last_error.as_deref(), Some("x"));
    }
}

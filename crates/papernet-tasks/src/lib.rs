//! papernet-tasks — Background job submission and progress tracking.
//!
//! Covers:
//! - Job submission (CSV import, journal and author refresh)
//! - Self-scheduling status polling with bounded retry
//! - Progress normalisation for display
//! - Project refetch once a job finishes
//! - State snapshots and notifications for views

pub mod backend;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod poller;
pub mod progress;
pub mod retry;
pub mod store;

pub use backend::{HttpTaskBackend, TaskBackend};
pub use jobs::Job;
pub use models::{ProjectData, Task, TaskInfo, TaskStatus};
pub use notify::{Level, Notification, Notifier};
pub use poller::{Canceller, PollHandle, PollOutcome, TaskPoller};
pub use progress::ProgressView;
pub use retry::RetryPolicy;
pub use store::{Phase, PollerState, Reservation, Store};

//! Job submission and status polling.
//!
//! Each status request is followed by a single-shot delay before the next
//! one, so at most one request per task is ever in flight. The loop ends
//! when the task reaches a terminal status or its id is cleared, and then
//! refetches the owning project once.

use std::sync::Arc;
use std::time::Duration;

use papernet_common::{PapernetError, Result};
use papernet_config::Config;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::backend::{HttpTaskBackend, TaskBackend};
use crate::jobs::Job;
use crate::models::Task;
use crate::notify::Notifier;
use crate::progress::ProgressView;
use crate::retry::RetryPolicy;
use crate::store::{Phase, Store};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The task reported `SUCCESS`.
    Completed(Task),
    /// The task reported `FAILURE` or `REVOKED`.
    Failed(Task),
    /// The task id was cleared before the task finished.
    Cancelled,
    /// Status requests failed more often than the retry policy allows.
    Stalled(String),
}

pub struct TaskPoller {
    backend: Arc<dyn TaskBackend>,
    store: Store,
    notifier: Notifier,
    interval: Duration,
    retry: RetryPolicy,
}

impl TaskPoller {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            backend,
            store: Store::new(),
            notifier: Notifier::default(),
            interval: DEFAULT_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    /// HTTP backend, interval and retry policy from the loaded config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = Arc::new(HttpTaskBackend::from_config(config)?);
        Ok(Self::new(backend)
            .with_interval(config.polling.interval())
            .with_retry(RetryPolicy::from_config(&config.polling)))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Submits `job` and starts polling the task it created.
    ///
    /// The first status request goes out one interval after the backend
    /// accepted the job. Dropping the returned future before the backend
    /// answers releases the poller again.
    #[instrument(skip(self), fields(kind = job.kind()))]
    pub async fn submit(&self, job: Job) -> Result<PollHandle> {
        let Some(reservation) = self.store.reserve() else {
            return Err(PapernetError::Busy(format!(
                "cannot start {job} while another task is running"
            )));
        };

        match self.backend.submit(&job).await {
            Ok(task_id) => {
                info!(task_id = %task_id, "Submitted {job}");
                reservation.commit(&task_id);
                Ok(self.start(task_id, job.project_id()))
            }
            Err(e) => {
                let message = format!("Submitting {job} failed: {e}");
                reservation.abort(&message);
                self.notifier.error(message);
                Err(e)
            }
        }
    }

    /// Starts polling a task that already exists on the backend.
    pub fn watch(&self, task_id: &str, project_id: Option<u64>) -> Result<PollHandle> {
        if task_id.is_empty() {
            return Err(PapernetError::Other(anyhow::anyhow!("task id must not be empty")));
        }
        let Some(reservation) = self.store.reserve() else {
            return Err(PapernetError::Busy(format!(
                "cannot watch task {task_id} while another task is running"
            )));
        };
        info!(task_id = %task_id, "Watching existing task");
        reservation.commit(task_id);
        Ok(self.start(task_id.to_string(), project_id))
    }

    fn start(&self, task_id: String, project_id: Option<u64>) -> PollHandle {
        let cancel = CancellationToken::new();
        let poll_loop = PollLoop {
            backend: self.backend.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            interval: self.interval,
            retry: self.retry.clone(),
            project_id,
            cancel: cancel.clone(),
        };
        let join = tokio::spawn(poll_loop.run());

        PollHandle {
            task_id,
            cancel,
            store: self.store.clone(),
            join,
        }
    }
}

/// Handle to a running polling loop.
///
/// Dropping the handle leaves the loop running.
#[derive(Debug)]
pub struct PollHandle {
    task_id: String,
    cancel: CancellationToken,
    store: Store,
    join: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Clears the task id and wakes the loop, which then finishes without
    /// issuing another status request.
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    /// Detached cancel switch, e.g. for a signal handler.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            task_id: self.task_id.clone(),
            store: self.store.clone(),
            token: self.cancel.clone(),
        }
    }

    /// Waits for the loop to finish.
    pub async fn finished(self) -> Result<PollOutcome> {
        self.join
            .await
            .map_err(|e| PapernetError::Other(anyhow::anyhow!("poll loop panicked: {e}")))
    }
}

#[derive(Debug, Clone)]
pub struct Canceller {
    task_id: String,
    store: Store,
    token: CancellationToken,
}

impl Canceller {
    pub fn cancel(&self) {
        self.store.clear_task_id(&self.task_id);
        self.token.cancel();
    }
}

struct PollLoop {
    backend: Arc<dyn TaskBackend>,
    store: Store,
    notifier: Notifier,
    interval: Duration,
    retry: RetryPolicy,
    project_id: Option<u64>,
    cancel: CancellationToken,
}

impl PollLoop {
    async fn run(self) -> PollOutcome {
        let mut failures = 0u32;
        let mut delay = self.interval;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }

            let task_id = self.store.task_id();
            if task_id.is_empty() {
                debug!("Task id cleared, stopping");
                return self.finish(PollOutcome::Cancelled).await;
            }

            match self.backend.progress(&task_id).await {
                Ok(task) => {
                    failures = 0;
                    delay = self.interval;

                    let progress = ProgressView::from_task(&task);
                    debug!(task_id = %task_id, status = %task.status, width = %progress, "Progress");
                    self.store.update(|s| {
                        s.task = Some(task.clone());
                        s.progress = progress;
                    });

                    if task.status.is_terminal() {
                        let outcome = if task.status.is_success() {
                            PollOutcome::Completed(task)
                        } else {
                            PollOutcome::Failed(task)
                        };
                        return self.finish(outcome).await;
                    }
                }
                Err(e) => {
                    failures += 1;
                    if !self.retry.should_retry(failures) {
                        return self.stall(&task_id, failures, e);
                    }
                    delay = self.retry.backoff(failures);
                    warn!(task_id = %task_id, attempt = failures, ?delay, "Status request failed: {e}");
                }
            }
        }
    }

    fn stall(&self, task_id: &str, failures: u32, e: PapernetError) -> PollOutcome {
        let message = format!("Lost track of task {task_id} after {failures} failed status requests: {e}");
        self.store.update(|s| {
            s.phase = Phase::Stalled;
            s.last_error = Some(message.clone());
        });
        self.notifier.error(message.clone());
        PollOutcome::Stalled(message)
    }

    async fn finish(&self, outcome: PollOutcome) -> PollOutcome {
        let failure = match &outcome {
            PollOutcome::Completed(task) => {
                self.notifier.success(format!("Task {} finished", task.id));
                None
            }
            PollOutcome::Failed(task) => {
                let detail = task.info.failure_detail().unwrap_or_else(|| task.status.to_string());
                let message = format!("Task {} failed: {detail}", task.id);
                self.notifier.error(message.clone());
                Some(message)
            }
            PollOutcome::Cancelled => {
                self.notifier.info("Stopped tracking task");
                None
            }
            PollOutcome::Stalled(message) => Some(message.clone()),
        };

        self.store.update(|s| s.task_id.clear());

        if let Some(project_id) = self.project_id {
            match self.backend.project_data(project_id).await {
                Ok(data) => self.store.update(|s| s.project = Some(data)),
                Err(e) => self.notifier.error(format!("Reloading project {project_id} failed: {e}")),
            }
        }

        self.store.update(|s| {
            s.phase = Phase::Idle;
            if failure.is_some() {
                s.last_error = failure;
            }
        });
        outcome
    }
}

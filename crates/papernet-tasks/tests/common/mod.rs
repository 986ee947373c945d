//! Scripted in-memory backend for poller tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use papernet_common::{PapernetError, Result};
use papernet_tasks::{Job, ProjectData, Task, TaskBackend, TaskInfo, TaskStatus};
use tokio::time::Instant;

/// One scripted answer to a status request.
pub enum Step {
    Status(TaskStatus, Option<TaskInfo>),
    Fail(&'static str),
}

pub fn progress(current: u64, total: u64) -> Step {
    Step::Status(TaskStatus::Progress, Some(TaskInfo::counters(current, total)))
}

pub fn success() -> Step {
    Step::Status(TaskStatus::Success, None)
}

#[derive(Default)]
pub struct ScriptedBackend {
    pub task_id: String,
    pub fail_submit: bool,
    pub fail_refetch: bool,
    /// How long the backend takes to accept a job.
    pub submit_delay: Option<Duration>,
    steps: Mutex<VecDeque<Step>>,
    /// Last step repeats once the script runs out.
    last: Mutex<Option<(TaskStatus, Option<TaskInfo>)>>,
    submits: Mutex<Vec<Job>>,
    polls: Mutex<Vec<(String, Instant)>>,
    refetches: Mutex<Vec<u64>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            task_id: "task-1".to_string(),
            steps: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    pub fn with_submit_failure(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn with_refetch_failure(mut self) -> Self {
        self.fail_refetch = true;
        self
    }

    pub fn submit_count(&self) -> usize {
        self.submits.lock().unwrap().len()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.polls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn polled_ids(&self) -> Vec<String> {
        self.polls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn refetches(&self) -> Vec<u64> {
        self.refetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskBackend for ScriptedBackend {
    async fn submit(&self, job: &Job) -> Result<String> {
        self.submits.lock().unwrap().push(job.clone());
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_submit {
            return Err(PapernetError::Backend("upload_csv/ returned 500 Internal Server Error".into()));
        }
        Ok(self.task_id.clone())
    }

    async fn progress(&self, task_id: &str) -> Result<Task> {
        self.polls.lock().unwrap().push((task_id.to_string(), Instant::now()));

        let step = self.steps.lock().unwrap().pop_front();
        let (status, info) = match step {
            Some(Step::Fail(msg)) => return Err(PapernetError::Backend(msg.to_string())),
            Some(Step::Status(status, info)) => {
                *self.last.lock().unwrap() = Some((status.clone(), info.clone()));
                (status, info)
            }
            None => match self.last.lock().unwrap().clone() {
                Some(last) => last,
                None => return Err(PapernetError::Backend("script exhausted".into())),
            },
        };

        Ok(Task::new(task_id, status, info.unwrap_or_default()))
    }

    async fn project_data(&self, project_id: u64) -> Result<ProjectData> {
        self.refetches.lock().unwrap().push(project_id);
        if self.fail_refetch {
            return Err(PapernetError::Backend("project/data/ returned 404 Not Found".into()));
        }
        Ok(ProjectData {
            project: serde_json::json!({ "pk": project_id, "title": "Review" }),
            papers: vec![serde_json::json!({ "pk": 1, "title": "A paper" })],
            info: None,
        })
    }
}

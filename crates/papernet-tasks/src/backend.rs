//! Task endpoints of the Papernet backend.
//!
//! Endpoints used (relative to the configured base URL):
//!   submit:   upload_csv/, update/journal/{id}/, update/author/{id}/
//!   progress: get_progress/?task_id=<id>
//!   refetch:  project/data/{id}/

use async_trait::async_trait;
use papernet_common::{PapernetError, Result, ScopedClient};
use papernet_config::{expand_endpoint, Config, EndpointsConfig};
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use crate::jobs::Job;
use crate::models::{ProgressResponse, ProjectData, SubmitResponse, Task};

/// Common interface for the backend the poller talks to.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Start a job, returns the task id to poll.
    async fn submit(&self, job: &Job) -> Result<String>;

    /// Fetch the current state of a task.
    async fn progress(&self, task_id: &str) -> Result<Task>;

    /// Fetch the whole project collection.
    async fn project_data(&self, project_id: u64) -> Result<ProjectData>;
}

pub struct HttpTaskBackend {
    client: ScopedClient,
    endpoints: EndpointsConfig,
}

impl HttpTaskBackend {
    pub fn new(client: ScopedClient, endpoints: EndpointsConfig) -> Self {
        Self { client, endpoints }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ScopedClient::new(&config.backend.base_url, config.backend_timeout())?;
        Ok(Self::new(client, config.endpoints.clone()))
    }

    async fn csv_form(&self, project_id: u64, file: &std::path::Path) -> Result<Form> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        Ok(Form::new()
            .part("csv", part)
            .text("project_id", project_id.to_string()))
    }
}

/// Turns a non-2xx answer into a backend error.
fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(PapernetError::Backend(format!("{} returned {}", resp.url(), status)))
    }
}

/// Unwraps the `{"task": {...}, "success": true}` envelope of a status answer.
/// The backend does not echo the id, so the requested one is filled in.
fn task_from_response(body: ProgressResponse, task_id: &str) -> Result<Task> {
    match body.task {
        Some(mut task) if body.success => {
            if task.id.is_empty() {
                task.id = task_id.to_string();
            }
            Ok(task)
        }
        _ => Err(PapernetError::Backend(format!("no status for task {task_id}"))),
    }
}

#[async_trait]
impl TaskBackend for HttpTaskBackend {
    #[instrument(skip(self), fields(kind = job.kind()))]
    async fn submit(&self, job: &Job) -> Result<String> {
        let request = match job {
            Job::UploadCsv { project_id, file } => {
                let form = self.csv_form(*project_id, file).await?;
                self.client.post(&self.endpoints.upload_csv)?.multipart(form)
            }
            Job::UpdateJournal { journal_id, .. } => self
                .client
                .post(&expand_endpoint(&self.endpoints.update_journal, journal_id))?
                .json(&serde_json::json!({})),
            Job::UpdateAuthor { author_id, .. } => self
                .client
                .post(&expand_endpoint(&self.endpoints.update_author, author_id))?
                .json(&serde_json::json!({})),
        };

        let resp = check_status(request.send().await?)?;
        let body: SubmitResponse = resp.json().await?;
        if !body.success {
            return Err(PapernetError::Backend(
                body.message.unwrap_or_else(|| format!("{} rejected", job.kind())),
            ));
        }
        match body.task_id {
            Some(id) if !id.is_empty() => {
                debug!(task_id = %id, "Job accepted");
                Ok(id)
            }
            _ => Err(PapernetError::Backend(format!("{} answered without a task id", job.kind()))),
        }
    }

    #[instrument(skip(self))]
    async fn progress(&self, task_id: &str) -> Result<Task> {
        let resp = self
            .client
            .get(&self.endpoints.progress)?
            .query(&[("task_id", task_id)])
            .send()
            .await?;
        let bytes = check_status(resp)?.bytes().await?;
        let task = task_from_response(serde_json::from_slice(&bytes)?, task_id)?;
        debug!(status = %task.status, "Task status");
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn project_data(&self, project_id: u64) -> Result<ProjectData> {
        let resp = self
            .client
            .get(&expand_endpoint(&self.endpoints.project_data, project_id))?
            .send()
            .await?;
        let data: ProjectData = check_status(resp)?.json().await?;
        debug!(papers = data.papers.len(), "Project refetched");
        Ok(data)
    }
}

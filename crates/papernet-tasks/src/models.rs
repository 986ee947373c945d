//! Wire models for the task endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend task state as reported by the task runner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    Started,
    Progress,
    Success,
    Failure,
    Retry,
    Revoked,
    /// Custom states, e.g. "IN PROGRESS" from the CSV import.
    Other(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING"  => TaskStatus::Pending,
            "STARTED"  => TaskStatus::Started,
            "PROGRESS" => TaskStatus::Progress,
            "SUCCESS"  => TaskStatus::Success,
            "FAILURE"  => TaskStatus::Failure,
            "RETRY"    => TaskStatus::Retry,
            "REVOKED"  => TaskStatus::Revoked,
            _          => TaskStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending  => "PENDING",
            TaskStatus::Started  => "STARTED",
            TaskStatus::Progress => "PROGRESS",
            TaskStatus::Success  => "SUCCESS",
            TaskStatus::Failure  => "FAILURE",
            TaskStatus::Retry    => "RETRY",
            TaskStatus::Revoked  => "REVOKED",
            TaskStatus::Other(s) => s,
        }
    }

    /// No further polling happens after a terminal status.
    ///
    /// `FAILURE` and `REVOKED` count as terminal because the backend never
    /// moves a task out of them; only `SUCCESS` counts as completed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure | TaskStatus::Revoked)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        TaskStatus::parse(&raw)
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress counters attached to a task.
///
/// The backend sends whatever the running job stored: an object with
/// counters, `null`, or an exception message once the job failed. Anything
/// that isn't a usable number is left as `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct TaskInfo {
    pub current: Option<f64>,
    pub total: Option<f64>,
    pub added: Option<u64>,
    pub error: Option<u64>,
    pub errors: Vec<String>,
    pub raw: Value,
}

impl From<Value> for TaskInfo {
    fn from(raw: Value) -> Self {
        let number = |key: &str| raw.get(key).and_then(Value::as_f64).filter(|n| n.is_finite());
        let count = |key: &str| raw.get(key).and_then(Value::as_u64);

        let errors = raw
            .get("errors")
            .and_then(Value::as_array)
            .map(|errs| {
                errs.iter()
                    .map(|e| e.as_str().map(String::from).unwrap_or_else(|| e.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            current: number("current"),
            total: number("total"),
            added: count("added"),
            error: count("error"),
            errors,
            raw,
        }
    }
}

impl From<TaskInfo> for Value {
    fn from(info: TaskInfo) -> Self {
        info.raw
    }
}

impl TaskInfo {
    /// Counters only, for building fixtures and fakes.
    pub fn counters(current: u64, total: u64) -> Self {
        Self::from(serde_json::json!({ "current": current, "total": total }))
    }

    /// Human-readable failure detail, if the backend left one.
    pub fn failure_detail(&self) -> Option<String> {
        match &self.raw {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => map
                .get("exc_message")
                .or_else(|| map.get("message"))
                .map(|m| m.as_str().map(String::from).unwrap_or_else(|| m.to_string()))
                .or_else(|| (!self.errors.is_empty()).then(|| self.errors.join("; "))),
            _ => None,
        }
    }
}

/// Client-side copy of a backend task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "state")]
    pub status: TaskStatus,
    #[serde(default)]
    pub info: TaskInfo,
}

impl Task {
    pub fn new(id: impl Into<String>, status: TaskStatus, info: TaskInfo) -> Self {
        Self { id: id.into(), status, info }
    }
}

/// Answer to a job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    #[serde(default = "bool_true")]
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn bool_true() -> bool { true }

/// Answer to a status request.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub task: Option<Task>,
}

/// Project collection as returned by the project data endpoint, kept verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub project: Value,
    #[serde(default)]
    pub papers: Vec<Value>,
    #[serde(default)]
    pub info: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_known_and_custom() {
        assert_eq!(TaskStatus::parse("SUCCESS"), TaskStatus::Success);
        assert_eq!(TaskStatus::parse("progress"), TaskStatus::Progress);
        assert_eq!(
            TaskStatus::parse("IN PROGRESS"),
            TaskStatus::Other("IN PROGRESS".to_string())
        );
        assert_eq!(TaskStatus::Other("IN PROGRESS".into()).as_str(), "IN PROGRESS");
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Failure.is_terminal());
        assert!(TaskStatus::Revoked.is_terminal());
        assert!(!TaskStatus::Failure.is_success() && !TaskStatus::Revoked.is_success());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Retry.is_terminal());
        assert!(!TaskStatus::Other("IN PROGRESS".into()).is_terminal());
    }

    #[test]
    fn test_task_accepts_state_key() {
        let task: Task = serde_json::from_value(json!({
            "state": "IN PROGRESS",
            "info": { "total": 12, "current": 3, "added": 2, "error": 1, "errors": ["bad DOI"] }
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Other("IN PROGRESS".into()));
        assert_eq!(task.info.current, Some(3.0));
        assert_eq!(task.info.total, Some(12.0));
        assert_eq!(task.info.added, Some(2));
        assert_eq!(task.info.errors, vec!["bad DOI".to_string()]);
    }

    #[test]
    fn test_malformed_info_is_tolerated() {
        let task: Task = serde_json::from_value(json!({
            "status": "PROGRESS",
            "info": { "current": "ten" }
        }))
        .unwrap();
        assert_eq!(task.info.current, None);
        assert_eq!(task.info.total, None);

        let task: Task = serde_json::from_value(json!({ "status": "PENDING", "info": null })).unwrap();
        assert_eq!(task.info, TaskInfo::default());

        let task: Task = serde_json::from_value(json!({ "status": "SUCCESS" })).unwrap();
        assert_eq!(task.info.current, None);
    }

    #[test]
    fn test_failure_detail() {
        let info = TaskInfo::from(json!("ValueError: bad csv"));
        assert_eq!(info.failure_detail().as_deref(), Some("ValueError: bad csv"));

        let info = TaskInfo::from(json!({ "errors": ["a", "b"] }));
        assert_eq!(info.failure_detail().as_deref(), Some("a; b"));

        assert_eq!(TaskInfo::default().failure_detail(), None);
    }

    #[test]
    fn test_submit_response_defaults_to_success() {
        let resp: SubmitResponse = serde_json::from_value(json!({ "task_id": "abc" })).unwrap();
        assert!(resp.success);
        assert_eq!(resp.task_id.as_deref(), Some("abc"));
    }
}

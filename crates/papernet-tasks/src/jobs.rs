//! Background jobs the backend accepts.

use std::path::PathBuf;

/// A long-running backend job. Submitting one yields a task id to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Import the DOIs listed in a CSV file into a project.
    UploadCsv { project_id: u64, file: PathBuf },
    /// Pull the journal's papers from CrossRef.
    UpdateJournal { journal_id: u64, project_id: Option<u64> },
    /// Pull the author's papers from CrossRef.
    UpdateAuthor { author_id: u64, project_id: Option<u64> },
}

impl Job {
    /// Project whose data is refetched once the job finishes.
    pub fn project_id(&self) -> Option<u64> {
        match self {
            Job::UploadCsv { project_id, .. } => Some(*project_id),
            Job::UpdateJournal { project_id, .. } | Job::UpdateAuthor { project_id, .. } => *project_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Job::UploadCsv { .. }     => "upload_csv",
            Job::UpdateJournal { .. } => "update_journal",
            Job::UpdateAuthor { .. }  => "update_author",
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::UploadCsv { project_id, file } => {
                write!(f, "CSV import of {} into project {project_id}", file.display())
            }
            Job::UpdateJournal { journal_id, .. } => write!(f, "journal {journal_id} update"),
            Job::UpdateAuthor { author_id, .. }   => write!(f, "author {author_id} update"),
        }
    }
}

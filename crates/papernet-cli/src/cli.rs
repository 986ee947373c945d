//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use papernet_tasks::Job;

#[derive(Debug, Parser)]
#[command(name = "papernet", version, about = "Run Papernet background jobs and follow their progress")]
pub struct Args {
    /// Path to papernet.toml (defaults to $PAPERNET_CONFIG, then ./papernet.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import the papers listed in a CSV file into a project
    UploadCsv {
        #[arg(long)]
        project: u64,
        file: PathBuf,
    },
    /// Fetch a journal's papers
    UpdateJournal {
        journal_id: u64,
        /// Project to reload once the job is done
        #[arg(long)]
        project: Option<u64>,
    },
    /// Fetch an author's papers
    UpdateAuthor {
        author_id: u64,
        /// Project to reload once the job is done
        #[arg(long)]
        project: Option<u64>,
    },
    /// Follow a task submitted earlier
    Watch {
        task_id: String,
        /// Project to reload once the job is done
        #[arg(long)]
        project: Option<u64>,
    },
}

pub enum Action {
    Submit(Job),
    Watch { task_id: String, project_id: Option<u64> },
}

impl Command {
    pub fn into_action(self) -> Action {
        match self {
            Command::UploadCsv { project, file } => {
                Action::Submit(Job::UploadCsv { project_id: project, file })
            }
            Command::UpdateJournal { journal_id, project } => {
                Action::Submit(Job::UpdateJournal { journal_id, project_id: project })
            }
            Command::UpdateAuthor { author_id, project } => {
                Action::Submit(Job::UpdateAuthor { author_id, project_id: project })
            }
            Command::Watch { task_id, project } => Action::Watch { task_id, project_id: project },
        }
    }
}

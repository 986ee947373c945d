//! Papernet — command-line client for backend jobs.
//! Submits a job (or attaches to an existing task) and follows it to completion.

mod cli;
mod render;

use clap::Parser;
use papernet_config::Config;
use papernet_tasks::{PollOutcome, TaskPoller};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Action, Args};
use crate::render::ProgressRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the task id
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("papernet=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::load_with(args.config.as_deref())?;
    info!(base_url = %config.backend.base_url, "Configuration loaded");

    let poller = TaskPoller::from_config(&config)?;
    let states = poller.store().subscribe();
    let notes = poller.notifier().subscribe();

    let handle = match args.command.into_action() {
        Action::Submit(job) => poller.submit(job).await?,
        Action::Watch { task_id, project_id } => poller.watch(&task_id, project_id)?,
    };
    println!("{}", handle.task_id());

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, no longer tracking the task");
            canceller.cancel();
        }
    });

    let renderer = ProgressRenderer::spawn(states, notes);
    let outcome = handle.finished().await?;
    renderer.finish(&outcome);

    match outcome {
        PollOutcome::Completed(_) | PollOutcome::Cancelled => Ok(()),
        PollOutcome::Failed(task) => anyhow::bail!("task {} ended with {}", task.id, task.status),
        PollOutcome::Stalled(message) => anyhow::bail!(message),
    }
}

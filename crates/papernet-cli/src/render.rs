//! Terminal progress bar fed by poller snapshots.

use indicatif::{ProgressBar, ProgressStyle};
use papernet_tasks::{Level, Notification, PollOutcome, PollerState};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}";

pub struct ProgressRenderer {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressRenderer {
    pub fn spawn(
        mut states: watch::Receiver<PollerState>,
        mut notes: broadcast::Receiver<Notification>,
    ) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        let draw_bar = bar.clone();
        let task = tokio::spawn(async move {
            let mut notes_open = true;
            loop {
                tokio::select! {
                    changed = states.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = states.borrow_and_update().clone();
                        draw_bar.set_position(state.progress.percent().round() as u64);
                        draw_bar.set_message(status_line(&state));
                    }
                    note = notes.recv(), if notes_open => match note {
                        Ok(note) => draw_bar.println(note_line(&note)),
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => notes_open = false,
                    },
                }
            }
        });

        Self { bar, task }
    }

    pub fn finish(self, outcome: &PollOutcome) {
        self.task.abort();
        match outcome {
            PollOutcome::Completed(_) => {
                self.bar.set_position(100);
                self.bar.finish_with_message("done");
            }
            PollOutcome::Failed(task) => self.bar.abandon_with_message(format!("failed ({})", task.status)),
            PollOutcome::Cancelled => self.bar.abandon_with_message("cancelled"),
            PollOutcome::Stalled(_) => self.bar.abandon_with_message("stalled"),
        }
    }
}

fn status_line(state: &PollerState) -> String {
    let Some(task) = &state.task else {
        return format!("waiting for task {}", state.task_id);
    };
    let mut line = format!("{} {}", task.status, state.progress);
    if let (Some(current), Some(total)) = (task.info.current, task.info.total) {
        line.push_str(&format!(" ({current}/{total})"));
    }
    if let Some(errors) = task.info.error.filter(|n| *n > 0) {
        line.push_str(&format!(", {errors} errors"));
    }
    line
}

fn note_line(note: &Notification) -> String {
    let tag = match note.level {
        Level::Info    => "info",
        Level::Success => "ok",
        Level::Error   => "error",
    };
    format!("[{tag}] {}", note.message)
}

//! User-facing notifications, pushed to every subscribed view.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Broadcast sender for notifications. Sending with no subscriber is not an error.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.send(Level::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.send(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.send(Level::Error, message);
    }

    fn send(&self, level: Level, message: String) {
        let _ = self.tx.send(Notification { level, message });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

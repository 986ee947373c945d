//! Configuration loading for Papernet.
//! Reads papernet.toml from the current directory or the path in the PAPERNET_CONFIG env var.

use papernet_common::{PapernetError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_ENV: &str = "PAPERNET_CONFIG";
pub const BASE_URL_ENV: &str = "PAPERNET_BASE_URL";
const DEFAULT_CONFIG_PATH: &str = "papernet.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url()     -> String { "http://localhost:8000/papernet/".to_string() }
fn default_timeout_secs() -> u64    { 30 }

/// Endpoint paths, relative to `backend.base_url`. `{id}` is substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_upload_csv")]
    pub upload_csv: String,
    #[serde(default = "default_update_journal")]
    pub update_journal: String,
    #[serde(default = "default_update_author")]
    pub update_author: String,
    #[serde(default = "default_progress")]
    pub progress: String,
    #[serde(default = "default_project_data")]
    pub project_data: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            upload_csv: default_upload_csv(),
            update_journal: default_update_journal(),
            update_author: default_update_author(),
            progress: default_progress(),
            project_data: default_project_data(),
        }
    }
}

fn default_upload_csv()     -> String { "upload_csv/".to_string() }
fn default_update_journal() -> String { "update/journal/{id}/".to_string() }
fn default_update_author()  -> String { "update/author/{id}/".to_string() }
fn default_progress()       -> String { "get_progress/".to_string() }
fn default_project_data()   -> String { "project/data/{id}/".to_string() }

/// Fills the `{id}` placeholder of an endpoint template.
pub fn expand_endpoint(template: &str, id: impl std::fmt::Display) -> String {
    template.replace("{id}", &id.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub retry_multiplier: f64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            retry_max_attempts: default_max_attempts(),
            retry_initial_backoff_ms: default_initial_backoff_ms(),
            retry_max_backoff_ms: default_max_backoff_ms(),
            retry_multiplier: default_multiplier(),
        }
    }
}

fn default_interval_ms()        -> u64 { 500 }
fn default_max_attempts()       -> u32 { 5 }
fn default_initial_backoff_ms() -> u64 { 500 }
fn default_max_backoff_ms()     -> u64 { 8_000 }
fn default_multiplier()         -> f64 { 2.0 }

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_max_backoff_ms)
    }
}


impl Config {
    /// Load configuration from papernet.toml.
    /// Checks PAPERNET_CONFIG env var first, then current directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load configuration from `path`, or from the default location when
    /// `None`. An explicit path must exist.
    ///
    /// `.env` and the PAPERNET_BASE_URL override apply either way.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let path = std::env::var(CONFIG_ENV)
                    .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
                if Path::new(&path).exists() {
                    Self::read_file(Path::new(&path))?
                } else {
                    tracing::info!(path = %path, "No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| PapernetError::Config(format!("{}: {e}", path.display())))
    }

    /// Replaces the backend URL unless `base_url` is missing or blank.
    pub fn apply_base_url_override(&mut self, base_url: Option<String>) {
        if let Some(base_url) = base_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(base_url = %base_url, "Backend URL taken from {BASE_URL_ENV}");
            self.backend.base_url = base_url;
        }
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(PapernetError::Config("backend.base_url must not be empty".into()));
        }
        if self.polling.interval_ms == 0 {
            return Err(PapernetError::Config("polling.interval_ms must be > 0".into()));
        }
        if self.polling.retry_max_attempts == 0 {
            return Err(PapernetError::Config("polling.retry_max_attempts must be >= 1".into()));
        }
        if self.polling.retry_multiplier < 1.0 {
            return Err(PapernetError::Config("polling.retry_multiplier must be >= 1.0".into()));
        }
        Ok(())
    }
}

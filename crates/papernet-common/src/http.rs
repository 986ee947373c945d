use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;
use crate::error::PapernetError;

/// An HTTP client scoped to one backend: it resolves relative endpoint paths
/// against a base URL and refuses requests to any other host.
#[derive(Debug, Clone)]
pub struct ScopedClient {
    client: Client,
    base: Url,
    host: String,
}

impl ScopedClient {
    /// Creates a client for `base_url`. Only the base host may be contacted.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PapernetError> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last path segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let host = base
            .host_str()
            .ok_or_else(|| PapernetError::Config(format!("base URL has no host: {base_url}")))?
            .to_string();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| PapernetError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base, host })
    }

    /// Resolves an endpoint path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, PapernetError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Validates if a URL is permitted under the current scope.
    pub fn is_allowed(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| host == self.host)
            .unwrap_or(false)
    }

    /// Builds a GET request for an endpoint path.
    pub fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, PapernetError> {
        self.request(reqwest::Method::GET, path)
    }

    /// Builds a POST request for an endpoint path.
    pub fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, PapernetError> {
        self.request(reqwest::Method::POST, path)
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, PapernetError> {
        let url = self.url(path)?;
        if !self.is_allowed(&url) {
            return Err(PapernetError::Security(format!(
                "host outside the backend for URL {}",
                url
            )));
        }

        Ok(self.client.request(method, url))
    }
}

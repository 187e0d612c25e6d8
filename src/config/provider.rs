//! Working directory lookup.
//!
//! The remote server publishes its directory layout as a JSON document of the
//! form `{"paths": {"<key>": "<dir>"}}`. Any failure to fetch or read it falls
//! back to the configured default.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::protocol::Endpoint;

/// Timeout for the blocking configuration fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Supplies the directory a new session starts in.
pub trait WorkingDirectoryProvider {
    /// Never fails: implementations fall back to a default.
    fn working_directory(&self) -> String;
}

/// Always returns the same directory.
#[derive(Debug, Clone)]
pub struct FixedProvider(pub String);

impl WorkingDirectoryProvider for FixedProvider {
    fn working_directory(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Deserialize)]
struct RemoteConfig {
    #[serde(default)]
    paths: HashMap<String, String>,
}

/// Looks the directory up on the server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConfigProvider {
    url: Result<Url, url::ParseError>,
    key: String,
    fallback: String,
    timeout: Duration,
}

impl HttpConfigProvider {
    pub fn new(endpoint: &Endpoint, config_path: &str, key: &str, fallback: &str) -> Self {
        Self {
            url: endpoint.http_url(config_path),
            key: key.to_string(),
            fallback: fallback.to_string(),
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().ok().map(Url::as_str)
    }

    fn fetch(&self) -> Result<Option<String>> {
        let url = self.url.clone().context("Invalid config address")?;
        let body = ureq::get(url.as_str())
            .timeout(self.timeout)
            .call()
            .with_context(|| format!("Failed to fetch {}", url))?
            .into_string()
            .context("Failed to read config response")?;

        let config: RemoteConfig =
            serde_json::from_str(&body).context("Failed to parse config response")?;

        Ok(config
            .paths
            .get(&self.key)
            .filter(|dir| !dir.is_empty())
            .cloned())
    }
}

impl WorkingDirectoryProvider for HttpConfigProvider {
    fn working_directory(&self) -> String {
        match self.fetch() {
            Ok(Some(dir)) => {
                debug!(url = ?self.url(), %dir, "working directory from server");
                dir
            }
            Ok(None) => {
                warn!(key = %self.key, fallback = %self.fallback, "key missing from server config");
                self.fallback.clone()
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), fallback = %self.fallback, "config lookup failed");
                self.fallback.clone()
            }
        }
    }
}

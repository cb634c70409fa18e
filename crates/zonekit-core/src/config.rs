//! Client configuration
//!
//! Settings for binding a client to the provider: endpoints, credentials
//! and paging. Loaded from `ZONEKIT_*` environment variables or from a JSON
//! file. The file may hold the settings at the top level or nested as
//! `{"common": {"cloudflare": {...}}}`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::types::Credentials;

/// Default v4 REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Default Host API endpoint
pub const DEFAULT_HOST_API_URL: &str = "https://api.cloudflare.com/host-gw.html";

/// Provider client configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API
    #[serde(default = "default_api_url", alias = "url")]
    pub api_url: String,

    /// URL of the Host API
    #[serde(default = "default_host_api_url", alias = "host_url")]
    pub host_api_url: String,

    /// Account email, used with `api_key`
    #[serde(default)]
    pub email: Option<String>,

    /// Global API key, used with `email`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Scoped API token, an alternative to email + key
    #[serde(default)]
    pub api_token: Option<String>,

    /// Host key for the Host API
    #[serde(default)]
    pub host_key: Option<String>,

    /// Items requested per page of a listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// HTTP request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Nested file layout
#[derive(Deserialize)]
struct NestedFile {
    common: NestedCommon,
}

#[derive(Deserialize)]
struct NestedCommon {
    cloudflare: ClientConfig,
}

impl ClientConfig {
    /// Create a configuration with defaults and no credentials
    pub fn new() -> Self {
        Self {
            api_url: default_api_url(),
            host_api_url: default_host_api_url(),
            email: None,
            api_key: None,
            api_token: None,
            host_key: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load from `ZONEKIT_*` environment variables
    ///
    /// - `ZONEKIT_API_URL`, `ZONEKIT_HOST_API_URL`
    /// - `ZONEKIT_EMAIL`, `ZONEKIT_API_KEY`, `ZONEKIT_API_TOKEN`
    /// - `ZONEKIT_HOST_KEY`
    /// - `ZONEKIT_PAGE_SIZE`, `ZONEKIT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();
        if let Some(url) = lookup("ZONEKIT_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("ZONEKIT_HOST_API_URL") {
            config.host_api_url = url;
        }
        config.email = lookup("ZONEKIT_EMAIL");
        config.api_key = lookup("ZONEKIT_API_KEY");
        config.api_token = lookup("ZONEKIT_API_TOKEN");
        config.host_key = lookup("ZONEKIT_HOST_KEY");

        if let Some(raw) = lookup("ZONEKIT_PAGE_SIZE") {
            config.page_size = parse_number("ZONEKIT_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("ZONEKIT_TIMEOUT_SECS") {
            config.timeout_secs = parse_number("ZONEKIT_TIMEOUT_SECS", &raw)?;
        }
        Ok(config)
    }

    /// Parse a JSON document in the flat or the nested layout
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if value.get("common").is_some() {
            let nested: NestedFile = serde_json::from_value(value)?;
            return Ok(nested.common.cloudflare);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration file");
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(Error::config("API URL cannot be empty"));
        }
        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(Error::config(format!(
                "API URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            )));
        }
        if self.page_size == 0 {
            return Err(Error::config("Page size must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("Timeout must be > 0"));
        }
        self.credentials()?;
        Ok(())
    }

    /// The credentials this configuration carries
    ///
    /// An API token wins over email + key.
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = self.api_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Token(token.clone()));
        }
        match (&self.email, &self.api_key) {
            (Some(email), Some(api_key)) if !email.is_empty() && !api_key.is_empty() => {
                Ok(Credentials::ApiKey {
                    email: email.clone(),
                    api_key: api_key.clone(),
                })
            }
            (Some(_), _) | (_, Some(_)) => Err(Error::config(
                "Both email and api_key are required for key authentication",
            )),
            (None, None) => Err(Error::config(
                "No credentials configured: set api_token, or email and api_key",
            )),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Custom Debug implementation that hides the secrets
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<REDACTED>");
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("host_api_url", &self.host_api_url)
            .field("email", &self.email)
            .field("api_key", &redact(&self.api_key))
            .field("api_token", &redact(&self.api_token))
            .field("host_key", &redact(&self.host_key))
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be a number. Got: {}", name, raw)))
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_host_api_url() -> String {
    DEFAULT_HOST_API_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

//! Cloudflare Host API service
//!
//! The Host API is a single endpoint taking form POSTs. The action is named
//! by the `act` field and authenticated by the reseller's host key.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use zonekit_core::config::ClientConfig;
use zonekit_core::types::{HostUser, NewHostUser, UserLookup};
use zonekit_core::{Error, HostService, Result};

use crate::envelope::parse_host_response;
use crate::requests::{
    HostForm, full_zone_set_form, user_create_form, user_lookup_form, zone_list_form,
    zone_set_form,
};
use crate::service::build_client;

/// Host Service backed by the Cloudflare Host API
pub struct CloudflareHostService {
    url: String,

    /// ⚠️ NEVER log this value
    host_key: String,

    client: Client,
}

// Custom Debug implementation that hides the host key
impl std::fmt::Debug for CloudflareHostService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareHostService")
            .field("url", &self.url)
            .field("host_key", &"<REDACTED>")
            .finish()
    }
}

impl CloudflareHostService {
    /// Create a Host API client
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: Empty host key or an unusable HTTP client
    pub fn try_new(url: impl Into<String>, host_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let host_key = host_key.into();
        if host_key.is_empty() {
            return Err(Error::config("Cloudflare host key cannot be empty"));
        }
        Ok(Self {
            url: url.into(),
            host_key,
            client: build_client(timeout)?,
        })
    }

    /// Create a Host API client from configuration
    ///
    /// Fails with `Error::Config` when no host key is configured.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let host_key = config
            .host_key
            .as_deref()
            .ok_or_else(|| Error::config("No host key configured"))?;
        Self::try_new(&config.host_api_url, host_key, config.timeout())
    }

    fn call<T: DeserializeOwned>(&self, form: HostForm) -> Result<T> {
        let act = form.act().to_string();
        tracing::debug!("Host API request: {}", act);

        let response = self
            .client
            .post(&self.url)
            .form(form.pairs())
            .send()
            .map_err(|e| Error::http(format!("Host API {}: request failed: {}", act, e)))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| Error::http(format!("Host API {}: failed to read response: {}", act, e)))?;

        parse_host_response(status, &text, &act)
    }
}

impl HostService for CloudflareHostService {
    fn user_create(&self, user: &NewHostUser) -> Result<HostUser> {
        tracing::info!("Provisioning host user {}", user.email);
        self.call(user_create_form(&self.host_key, user))
    }

    fn user_lookup(&self, lookup: &UserLookup) -> Result<HostUser> {
        let user: Option<HostUser> = self
            .call::<Value>(user_lookup_form(&self.host_key, lookup))
            .and_then(|response| match response {
                Value::Null => Ok(None),
                Value::Object(ref fields) if !fields.contains_key("user_key") => Ok(None),
                other => serde_json::from_value(other).map(Some).map_err(Error::from),
            })?;
        user.ok_or_else(|| Error::not_found(format!("Host user {:?}", lookup)))
    }

    fn zone_list(&self, offset: u64, limit: usize) -> Result<Vec<Value>> {
        self.call(zone_list_form(&self.host_key, offset, limit))
    }

    fn full_zone_set(&self, zone_name: &str, user_key: &str, jump_start: bool) -> Result<Value> {
        tracing::info!("Setting up full zone {}", zone_name);
        self.call(full_zone_set_form(&self.host_key, zone_name, user_key, jump_start))
    }

    fn zone_set(
        &self,
        zone_name: &str,
        user_key: &str,
        subdomains: &[String],
        resolve_to: &str,
    ) -> Result<Value> {
        tracing::info!("Setting up CNAME zone {} -> {}", zone_name, resolve_to);
        self.call(zone_set_form(
            &self.host_key,
            zone_name,
            user_key,
            subdomains,
            resolve_to,
        ))
    }
}

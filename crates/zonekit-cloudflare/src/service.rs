//! Cloudflare v4 Resource Service
//!
//! One HTTP request per trait call. No retry, backoff or caching: every
//! failure is returned to the object model as-is.

use reqwest::Method;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::rc::Rc;
use std::time::Duration;

use zonekit_core::config::ClientConfig;
use zonekit_core::types::{Credentials, Fields, NewZone, PurgeRequest, Setting, SettingUpdate};
use zonekit_core::{Error, ResourceService, ResourceServiceFactory, Result};

use crate::envelope::parse_envelope;
use crate::requests::{endpoint, page_query, purge_body, setting_body, settings_body};

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the blocking HTTP client shared by both services
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Resource Service backed by the Cloudflare v4 REST API
///
/// # Authentication
///
/// - [`Credentials::ApiKey`]: `X-Auth-Email` and `X-Auth-Key` headers
/// - [`Credentials::Token`]: `Authorization: Bearer <token>`
///
/// # Unpaginated Listings
///
/// Zone settings and page rules come back whole. For those listings page 1
/// carries everything and later pages are empty, without a request.
pub struct CloudflareService {
    base_url: String,

    /// ⚠️ NEVER log these
    credentials: Credentials,

    client: Client,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareService")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl CloudflareService {
    /// Create a service for one account
    ///
    /// # Parameters
    ///
    /// - `base_url`: v4 API root, e.g. `https://api.cloudflare.com/client/v4`
    /// - `credentials`: Account credentials
    /// - `timeout`: Per-request timeout
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: Empty credentials or an unusable HTTP client
    pub fn try_new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let empty = match &credentials {
            Credentials::ApiKey { email, api_key } => email.is_empty() || api_key.is_empty(),
            Credentials::Token(token) => token.is_empty(),
        };
        if empty {
            return Err(Error::config("Cloudflare credentials cannot be empty"));
        }

        Ok(Self {
            base_url: base_url.into(),
            credentials,
            client: build_client(timeout)?,
        })
    }

    /// Create a service from a validated client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::try_new(&config.api_url, config.credentials()?, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        what: &str,
    ) -> Result<T> {
        let url = endpoint(&self.base_url, path);
        tracing::debug!("Cloudflare request: {} {}", method, path);

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        request = match &self.credentials {
            Credentials::ApiKey { email, api_key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", api_key),
            Credentials::Token(token) => request.bearer_auth(token),
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| Error::http(format!("{}: request failed: {}", what, e)))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| Error::http(format!("{}: failed to read response: {}", what, e)))?;

        if !(200..300).contains(&status) {
            tracing::warn!("Cloudflare answered {} for {}", status, what);
        }
        parse_envelope(status, &text, what)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)], what: &str) -> Result<T> {
        self.request(Method::GET, path, query, None, what)
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
        what: &str,
    ) -> Result<T> {
        self.request(method, path, &[], Some(body), what)
    }

    fn delete(&self, path: &str, what: &str) -> Result<()> {
        let _: Value = self.request(Method::DELETE, path, &[], None, what)?;
        Ok(())
    }
}

impl ResourceService for CloudflareService {
    fn list_zones(&self, page: u64, per_page: usize) -> Result<Vec<Fields>> {
        self.get("zones", &page_query(page, per_page), "list zones")
    }

    fn get_zone(&self, zone_id: &str) -> Result<Fields> {
        self.get(&format!("zones/{}", zone_id), &[], &format!("zone {}", zone_id))
    }

    fn get_zone_by_name(&self, name: &str) -> Result<Fields> {
        let what = format!("zone named {}", name);
        let zones: Vec<Fields> = self.get("zones", &[("name", name.to_string())], &what)?;
        zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(what))
    }

    fn create_zone(&self, zone: &NewZone) -> Result<Fields> {
        tracing::info!("Creating zone {}", zone.name);
        let body = serde_json::to_value(zone)?;
        self.send(Method::POST, "zones", &body, "create zone")
    }

    fn delete_zone(&self, zone_id: &str) -> Result<()> {
        tracing::info!("Deleting zone {}", zone_id);
        self.delete(&format!("zones/{}", zone_id), "delete zone")
    }

    fn list_zone_settings(
        &self,
        zone_id: &str,
        page: u64,
        _per_page: usize,
    ) -> Result<Vec<Setting>> {
        if page > 1 {
            return Ok(Vec::new());
        }
        self.get(&format!("zones/{}/settings", zone_id), &[], "zone settings")
    }

    fn set_zone_settings(&self, zone_id: &str, items: &[SettingUpdate]) -> Result<Vec<Setting>> {
        tracing::info!("Updating {} setting(s) of zone {}", items.len(), zone_id);
        self.send(
            Method::PATCH,
            &format!("zones/{}/settings", zone_id),
            &settings_body(items),
            "update zone settings",
        )
    }

    fn set_zone_setting(&self, zone_id: &str, setting_id: &str, value: &Value) -> Result<Setting> {
        tracing::info!("Updating setting {} of zone {}", setting_id, zone_id);
        self.send(
            Method::PATCH,
            &format!("zones/{}/settings/{}", zone_id, setting_id),
            &setting_body(value),
            &format!("update setting {}", setting_id),
        )
    }

    fn list_dns_records(&self, zone_id: &str, page: u64, per_page: usize) -> Result<Vec<Fields>> {
        self.get(
            &format!("zones/{}/dns_records", zone_id),
            &page_query(page, per_page),
            "list DNS records",
        )
    }

    fn create_dns_record(&self, zone_id: &str, fields: &Fields) -> Result<Fields> {
        self.send(
            Method::POST,
            &format!("zones/{}/dns_records", zone_id),
            &Value::Object(fields.clone()),
            "create DNS record",
        )
    }

    fn update_dns_record(&self, zone_id: &str, record_id: &str, fields: &Fields) -> Result<Fields> {
        self.send(
            Method::PUT,
            &format!("zones/{}/dns_records/{}", zone_id, record_id),
            &Value::Object(fields.clone()),
            &format!("DNS record {}", record_id),
        )
    }

    fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.delete(
            &format!("zones/{}/dns_records/{}", zone_id, record_id),
            &format!("DNS record {}", record_id),
        )
    }

    fn list_page_rules(&self, zone_id: &str, page: u64, _per_page: usize) -> Result<Vec<Fields>> {
        if page > 1 {
            return Ok(Vec::new());
        }
        self.get(&format!("zones/{}/pagerules", zone_id), &[], "list page rules")
    }

    fn create_page_rule(&self, zone_id: &str, fields: &Fields) -> Result<Fields> {
        self.send(
            Method::POST,
            &format!("zones/{}/pagerules", zone_id),
            &Value::Object(fields.clone()),
            "create page rule",
        )
    }

    fn update_page_rule(&self, zone_id: &str, rule_id: &str, fields: &Fields) -> Result<Fields> {
        self.send(
            Method::PUT,
            &format!("zones/{}/pagerules/{}", zone_id, rule_id),
            &Value::Object(fields.clone()),
            &format!("page rule {}", rule_id),
        )
    }

    fn delete_page_rule(&self, zone_id: &str, rule_id: &str) -> Result<()> {
        self.delete(
            &format!("zones/{}/pagerules/{}", zone_id, rule_id),
            &format!("page rule {}", rule_id),
        )
    }

    fn purge_cache(&self, zone_id: &str, request: &PurgeRequest) -> Result<()> {
        tracing::info!("Purging cache of zone {}", zone_id);
        let _: Value = self.send(
            Method::POST,
            &format!("zones/{}/purge_cache", zone_id),
            &purge_body(request),
            "purge cache",
        )?;
        Ok(())
    }

    fn get_ssl_verification_info(&self, zone_id: &str) -> Result<Value> {
        self.get(
            &format!("zones/{}/ssl/verification", zone_id),
            &[],
            "SSL verification",
        )
    }
}

/// Factory binding [`CloudflareService`] instances to credentials
#[derive(Debug, Clone)]
pub struct CloudflareServiceFactory {
    base_url: String,
    timeout: Duration,
}

impl CloudflareServiceFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_url).with_timeout(config.timeout())
    }
}

impl ResourceServiceFactory for CloudflareServiceFactory {
    fn create(&self, credentials: &Credentials) -> Result<Rc<dyn ResourceService>> {
        let service = CloudflareService::try_new(&self.base_url, credentials.clone(), self.timeout)?;
        Ok(Rc::new(service))
    }
}

//! Request shaping
//!
//! URL, query and body construction for both APIs, separated from the HTTP
//! client so the wire format can be tested without a network.

use serde_json::{Value, json};
use zonekit_core::types::{NewHostUser, PurgeRequest, SettingUpdate, UserLookup};

/// Join a base URL and a relative path with exactly one slash
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Query pairs of one page of a numbered listing
pub fn page_query(page: u64, per_page: usize) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("per_page", per_page.to_string())]
}

/// Body of `POST zones/{id}/purge_cache`
pub fn purge_body(request: &PurgeRequest) -> Value {
    match request {
        PurgeRequest::Everything => json!({"purge_everything": true}),
        PurgeRequest::Selective { files, tags } => {
            let mut body = serde_json::Map::new();
            if !files.is_empty() {
                body.insert("files".to_string(), json!(files));
            }
            if !tags.is_empty() {
                body.insert("tags".to_string(), json!(tags));
            }
            Value::Object(body)
        }
    }
}

/// Body of `PATCH zones/{id}/settings`
pub fn settings_body(items: &[SettingUpdate]) -> Value {
    json!({ "items": items })
}

/// Body of `PATCH zones/{id}/settings/{name}`
pub fn setting_body(value: &Value) -> Value {
    json!({ "value": value })
}

/// Form of one Host API call
///
/// Every call is a form POST naming the action in `act` and carrying the
/// host key.
#[derive(Clone, PartialEq, Eq)]
pub struct HostForm {
    fields: Vec<(&'static str, String)>,
}

impl HostForm {
    pub fn new(act: &str, host_key: &str) -> Self {
        Self {
            fields: vec![("act", act.to_string()), ("host_key", host_key.to_string())],
        }
    }

    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub fn optional(self, name: &'static str, value: Option<&String>) -> Self {
        match value {
            Some(value) => self.field(name, value.clone()),
            None => self,
        }
    }

    /// Value of the `act` field
    pub fn act(&self) -> &str {
        self.get("act").unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.fields
    }
}

// Custom Debug implementation that hides the host key and passwords
impl std::fmt::Debug for HostForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_map();
        for (name, value) in &self.fields {
            if matches!(*name, "host_key" | "cloudflare_pass") {
                list.entry(name, &"<REDACTED>");
            } else {
                list.entry(name, value);
            }
        }
        list.finish()
    }
}

pub fn user_create_form(host_key: &str, user: &NewHostUser) -> HostForm {
    HostForm::new("user_create", host_key)
        .field("cloudflare_email", user.email.clone())
        .field("cloudflare_pass", user.password.clone())
        .optional("cloudflare_username", user.username.as_ref())
        .optional("unique_id", user.unique_id.as_ref())
}

pub fn user_lookup_form(host_key: &str, lookup: &UserLookup) -> HostForm {
    let form = HostForm::new("user_lookup", host_key);
    match lookup {
        UserLookup::Email(email) => form.field("cloudflare_email", email.clone()),
        UserLookup::UniqueId(id) => form.field("unique_id", id.clone()),
    }
}

pub fn zone_list_form(host_key: &str, offset: u64, limit: usize) -> HostForm {
    HostForm::new("zone_list", host_key)
        .field("offset", offset.to_string())
        .field("limit", limit.to_string())
}

pub fn full_zone_set_form(
    host_key: &str,
    zone_name: &str,
    user_key: &str,
    jump_start: bool,
) -> HostForm {
    HostForm::new("full_zone_set", host_key)
        .field("user_key", user_key)
        .field("zone_name", zone_name)
        .field("jumpstart", if jump_start { "1" } else { "0" })
}

pub fn zone_set_form(
    host_key: &str,
    zone_name: &str,
    user_key: &str,
    subdomains: &[String],
    resolve_to: &str,
) -> HostForm {
    HostForm::new("zone_set", host_key)
        .field("user_key", user_key)
        .field("zone_name", zone_name)
        .field("resolve_to", resolve_to)
        .field("subdomains", subdomains.join(","))
}

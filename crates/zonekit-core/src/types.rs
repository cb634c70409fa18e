//! Request and response shapes exchanged with the backing services
//!
//! Remote entities (zones, DNS records, page rules) travel as open field
//! bags: the set of fields is whatever the server returned. Settings, host
//! users and the various request payloads have a fixed shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field bag of one remote entity, keyed by field name
pub type Fields = serde_json::Map<String, Value>;

/// One zone setting as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting name (e.g. "always_online")
    pub id: String,
    /// Current value; shape depends on the setting
    pub value: Value,
    /// Whether the server accepts writes to this setting
    #[serde(default)]
    pub editable: bool,
    /// Last modification time, when reported
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

/// One entry of a batch settings update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub id: String,
    pub value: Value,
}

/// Payload for creating a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewZone {
    pub name: String,
    #[serde(default)]
    pub jump_start: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Value>,
}

impl NewZone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jump_start: false,
            organization: None,
        }
    }

    pub fn with_jump_start(mut self, jump_start: bool) -> Self {
        self.jump_start = jump_start;
        self
    }

    pub fn with_organization(mut self, organization: Value) -> Self {
        self.organization = Some(organization);
        self
    }
}

/// What a cache purge should remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeRequest {
    /// Drop every cached asset of the zone
    Everything,
    /// Drop only the listed files and cache tags
    Selective {
        files: Vec<String>,
        tags: Vec<String>,
    },
}

impl PurgeRequest {
    /// Shape the purge parameters: with neither files nor tags the whole
    /// zone is purged.
    pub fn from_parts(files: Option<Vec<String>>, tags: Option<Vec<String>>) -> Self {
        let files = files.unwrap_or_default();
        let tags = tags.unwrap_or_default();
        if files.is_empty() && tags.is_empty() {
            PurgeRequest::Everything
        } else {
            PurgeRequest::Selective { files, tags }
        }
    }
}

/// Credentials binding a Resource Service to one account
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Account email plus global API key
    ApiKey { email: String, api_key: String },
    /// Scoped API token
    Token(String),
}

// Custom Debug implementation that hides the secrets
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("email", email)
                .field("api_key", &"<REDACTED>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
        }
    }
}

/// A user record as held by the Host Service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUser {
    pub cloudflare_email: String,
    #[serde(default)]
    pub cloudflare_username: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    pub user_api_key: String,
    pub user_key: String,
}

impl std::fmt::Debug for HostUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostUser")
            .field("cloudflare_email", &self.cloudflare_email)
            .field("cloudflare_username", &self.cloudflare_username)
            .field("unique_id", &self.unique_id)
            .field("user_api_key", &"<REDACTED>")
            .field("user_key", &"<REDACTED>")
            .finish()
    }
}

/// Payload for provisioning a user through the Host Service
#[derive(Clone, PartialEq, Eq)]
pub struct NewHostUser {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub unique_id: Option<String>,
}

impl std::fmt::Debug for NewHostUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewHostUser")
            .field("email", &self.email)
            .field("password", &"<REDACTED>")
            .field("username", &self.username)
            .field("unique_id", &self.unique_id)
            .finish()
    }
}

/// How to find an existing user through the Host Service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Email(String),
    UniqueId(String),
}

/// Read an RFC 3339 timestamp field out of a field bag
pub(crate) fn timestamp_field(fields: &Fields, name: &str) -> Option<DateTime<Utc>> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

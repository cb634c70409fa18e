//! DNS record proxy
//!
//! A [`Record`] mirrors one remote DNS record. Edits are staged locally and
//! sent by [`Record::save`]; renaming a record changes how its zone groups
//! records by name, so a rename drops the zone's `records` memo.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

use super::fields::{FieldState, ZoneLink, entity_id};
use crate::error::{Error, Result};
use crate::types::{Fields, timestamp_field};

const RESOURCE: &str = "Record";

/// Local proxy for one DNS record
///
/// A `Record` is a handle: clones share one field state, so an edit saved
/// through any clone is what the zone's `records` memo shows.
#[derive(Clone)]
pub struct Record {
    id: String,
    link: ZoneLink,
    fields: Rc<RefCell<FieldState>>,
}

impl Record {
    pub(crate) fn new(link: ZoneLink, fields: Fields) -> Result<Self> {
        Ok(Self {
            id: entity_id(RESOURCE, &fields)?,
            link,
            fields: Rc::new(RefCell::new(FieldState::new(fields))),
        })
    }

    /// Server-assigned record id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the owning zone
    pub fn zone_id(&self) -> &str {
        &self.link.zone_id
    }

    /// Read a field, seeing pending edits first
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The field value
    /// - `Err(Error::AttributeNotFound)`: The record has no such field
    pub fn get(&self, field: &str) -> Result<Value> {
        self.fields.borrow().get(RESOURCE, field).cloned()
    }

    /// Stage a new value for a field the server returned
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The edit is pending until [`Record::save`]
    /// - `Err(Error::Validation)`: The field is not part of the record
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.fields
            .borrow_mut()
            .set(RESOURCE, field, value.into())
    }

    pub fn name(&self) -> Option<String> {
        self.str_field("name")
    }

    pub fn record_type(&self) -> Option<String> {
        self.str_field("type")
    }

    pub fn content(&self) -> Option<String> {
        self.str_field("content")
    }

    pub fn ttl(&self) -> Option<u64> {
        self.get("ttl").ok().as_ref().and_then(Value::as_u64)
    }

    pub fn proxied(&self) -> Option<bool> {
        self.get("proxied").ok().as_ref().and_then(Value::as_bool)
    }

    pub fn priority(&self) -> Option<u64> {
        self.get("priority").ok().as_ref().and_then(Value::as_u64)
    }

    /// Protocol-specific nested fields (SRV service, port, target, ...)
    pub fn data(&self) -> Option<Fields> {
        match self.get("data") {
            Ok(Value::Object(data)) => Some(data),
            _ => None,
        }
    }

    /// Read one key of the nested `data` map
    pub fn data_field(&self, key: &str) -> Result<Value> {
        self.data()
            .and_then(|mut data| data.remove(key))
            .ok_or_else(|| Error::attribute(RESOURCE, format!("data.{}", key)))
    }

    /// Stage a value inside the nested `data` map
    pub fn set_data_field(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        match self.fields.borrow_mut().working_mut().get_mut("data") {
            Some(Value::Object(data)) => {
                data.insert(key.to_string(), value.into());
                Ok(())
            }
            _ => Err(Error::validation("Record has no data map")),
        }
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        timestamp_field(self.fields.borrow().working(), "created_on")
    }

    pub fn modified_on(&self) -> Option<DateTime<Utc>> {
        timestamp_field(self.fields.borrow().working(), "modified_on")
    }

    /// The full field bag, pending edits included
    pub fn fields(&self) -> Fields {
        self.fields.borrow().working().clone()
    }

    /// Whether any field differs from the last known server state
    pub fn is_dirty(&self) -> bool {
        self.fields.borrow().is_dirty()
    }

    /// Send pending edits to the server
    ///
    /// Without pending edits this makes no remote call. Otherwise the whole
    /// field bag is sent, the server's answer becomes the new state of every
    /// handle on this record, and a changed `name` invalidates the zone's
    /// `records` memo.
    pub fn save(&self) -> Result<()> {
        let (working, previous_name) = {
            let state = self.fields.borrow();
            if !state.is_dirty() {
                tracing::debug!(record = %self.id, "Record unchanged, nothing to save");
                return Ok(());
            }
            (state.working().clone(), state.saved().get("name").cloned())
        };

        tracing::info!(zone = %self.link.zone_id, record = %self.id, "Updating DNS record");
        let result = self
            .link
            .service
            .update_dns_record(&self.link.zone_id, &self.id, &working)?;

        let renamed = result.get("name") != previous_name.as_ref();
        self.fields.borrow_mut().replace(result);

        if renamed {
            self.link.invalidate_records();
        }
        Ok(())
    }

    /// Delete the record remotely and drop the zone's `records` memo
    pub fn delete(&self) -> Result<()> {
        tracing::info!(zone = %self.link.zone_id, record = %self.id, "Deleting DNS record");
        self.link
            .service
            .delete_dns_record(&self.link.zone_id, &self.id)?;
        self.link.invalidate_records();
        Ok(())
    }

    fn str_field(&self, field: &str) -> Option<String> {
        match self.get(field) {
            Ok(Value::String(value)) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ttl = self
            .get("ttl")
            .map(|v| v.to_string())
            .unwrap_or_default();
        write!(
            f,
            "Record<{} {} IN {} {}>",
            self.name().unwrap_or_default(),
            ttl,
            self.record_type().unwrap_or_default(),
            self.content().unwrap_or_default()
        )
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("zone_id", &self.link.zone_id)
            .field("fields", &*self.fields.borrow())
            .finish()
    }
}

/// Request to create a DNS record
///
/// Most types only need a name, a type and content. MX records also need a
/// priority; SRV records carry their target in a nested `data` object
/// instead of flat content, and need every SRV component.
///
/// ```rust
/// use zonekit_core::NewRecord;
///
/// let a = NewRecord::new("bar.example.com", "A").with_content("127.0.0.1");
/// assert!(a.to_fields().is_ok());
///
/// let mx = NewRecord::new("example.com", "MX").with_content("mail.example.net");
/// assert!(mx.to_fields().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub name: String,
    pub record_type: String,
    pub content: Option<String>,
    pub ttl: u32,
    pub proxied: bool,
    pub priority: Option<u16>,
    pub service: Option<String>,
    pub protocol: Option<String>,
    pub weight: Option<u16>,
    pub port: Option<u16>,
    pub target: Option<String>,
}

impl NewRecord {
    /// Start a request; TTL 1 means "automatic"
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            content: None,
            ttl: 1,
            proxied: false,
            priority: None,
            service: None,
            protocol: None,
            weight: None,
            port: None,
            target: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set every SRV component at once
    pub fn with_srv(
        mut self,
        service: impl Into<String>,
        protocol: impl Into<String>,
        weight: u16,
        port: u16,
        target: impl Into<String>,
    ) -> Self {
        self.service = Some(service.into());
        self.protocol = Some(protocol.into());
        self.weight = Some(weight);
        self.port = Some(port);
        self.target = Some(target.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Build the creation payload for this record type
    ///
    /// # Returns
    ///
    /// - `Ok(Fields)`: The payload to post
    /// - `Err(Error::Validation)`: A field the type requires is missing
    pub fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(self.name));
        fields.insert("type".into(), json!(self.record_type));
        fields.insert("ttl".into(), json!(self.ttl));
        fields.insert("proxied".into(), json!(self.proxied));

        if let Some(content) = self.content.as_deref().filter(|c| !c.is_empty()) {
            fields.insert("content".into(), json!(content));
        }

        match self.record_type.to_ascii_uppercase().as_str() {
            "MX" => {
                let priority = self
                    .priority
                    .ok_or_else(|| Error::validation("MX records require a priority"))?;
                fields.insert("priority".into(), json!(priority));
            }
            "SRV" => {
                fields.insert("data".into(), Value::Object(self.srv_data()?));
            }
            _ => {}
        }

        Ok(fields)
    }

    fn srv_data(&self) -> Result<Fields> {
        let missing: Vec<&str> = [
            ("service", self.service.is_none()),
            ("protocol", self.protocol.is_none()),
            ("priority", self.priority.is_none()),
            ("weight", self.weight.is_none()),
            ("port", self.port.is_none()),
            ("target", self.target.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "SRV records require: {}",
                missing.join(", ")
            )));
        }

        let mut data = Fields::new();
        data.insert("name".into(), json!(self.name));
        data.insert("service".into(), json!(self.service));
        data.insert("proto".into(), json!(self.protocol));
        data.insert("priority".into(), json!(self.priority));
        data.insert("weight".into(), json!(self.weight));
        data.insert("port".into(), json!(self.port));
        data.insert("target".into(), json!(self.target));
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srv() -> NewRecord {
        NewRecord::new("bar.example.com", "SRV")
            .with_priority(10)
            .with_srv("_sip", "_tcp", 5, 8806, "example.net")
    }

    #[test]
    fn a_record_payload() {
        let fields = NewRecord::new("bar.example.com", "A")
            .with_content("127.0.0.1")
            .to_fields()
            .unwrap();
        assert_eq!(fields["name"], "bar.example.com");
        assert_eq!(fields["type"], "A");
        assert_eq!(fields["content"], "127.0.0.1");
        assert_eq!(fields["ttl"], 1);
        assert_eq!(fields["proxied"], false);
        assert!(!fields.contains_key("priority"));
        assert!(!fields.contains_key("data"));
    }

    #[test]
    fn empty_content_is_omitted() {
        let fields = NewRecord::new("x.example.com", "A")
            .with_content("")
            .to_fields()
            .unwrap();
        assert!(!fields.contains_key("content"));
    }

    #[test]
    fn mx_requires_priority() {
        let mx = NewRecord::new("example.com", "MX").with_content("mail.net");
        assert!(matches!(mx.to_fields(), Err(Error::Validation(_))));

        let fields = mx.with_priority(10).to_fields().unwrap();
        assert_eq!(fields["priority"], 10);
    }

    #[test]
    fn srv_payload_is_nested() {
        let fields = srv().to_fields().unwrap();
        let data = fields["data"].as_object().unwrap();
        assert_eq!(data["service"], "_sip");
        assert_eq!(data["proto"], "_tcp");
        assert_eq!(data["priority"], 10);
        assert_eq!(data["weight"], 5);
        assert_eq!(data["port"], 8806);
        assert_eq!(data["target"], "example.net");
        assert_eq!(data["name"], "bar.example.com");
        assert!(!fields.contains_key("content"));
    }

    #[test]
    fn srv_requires_every_component() {
        let cases = [
            NewRecord { service: None, ..srv() },
            NewRecord { protocol: None, ..srv() },
            NewRecord { priority: None, ..srv() },
            NewRecord { weight: None, ..srv() },
            NewRecord { port: None, ..srv() },
            NewRecord { target: None, ..srv() },
        ];
        for case in cases {
            assert!(
                matches!(case.to_fields(), Err(Error::Validation(_))),
                "accepted incomplete SRV: {:?}",
                case
            );
        }
    }

    #[test]
    fn srv_error_names_missing_parts() {
        let err = NewRecord::new("x.example.com", "srv")
            .with_priority(1)
            .to_fields()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("service"));
        assert!(msg.contains("target"));
        assert!(!msg.contains("priority"));
    }
}

//! Saved/working field bags shared by the per-zone resource proxies

use serde_json::Value;
use std::rc::{Rc, Weak};

use super::zone::ZoneInner;
use crate::error::{Error, Result};
use crate::traits::ResourceService;
use crate::types::Fields;

/// Last known server state plus the locally edited copy
///
/// The set of known fields is fixed by what the server returned; writes
/// never add new fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldState {
    saved: Fields,
    working: Fields,
}

impl FieldState {
    pub(crate) fn new(fields: Fields) -> Self {
        Self {
            working: fields.clone(),
            saved: fields,
        }
    }

    /// Pending value if edited, else the saved one
    pub(crate) fn get(&self, resource: &'static str, field: &str) -> Result<&Value> {
        self.working
            .get(field)
            .or_else(|| self.saved.get(field))
            .ok_or_else(|| Error::attribute(resource, field))
    }

    pub(crate) fn set(&mut self, resource: &'static str, field: &str, value: Value) -> Result<()> {
        if !self.saved.contains_key(field) {
            return Err(Error::validation(format!(
                "{} has no field '{}'",
                resource, field
            )));
        }
        self.working.insert(field.to_string(), value);
        Ok(())
    }

    pub(crate) fn working_mut(&mut self) -> &mut Fields {
        &mut self.working
    }

    pub(crate) fn working(&self) -> &Fields {
        &self.working
    }

    pub(crate) fn saved(&self) -> &Fields {
        &self.saved
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.working != self.saved
    }

    /// Adopt a server response as both saved and working state
    pub(crate) fn replace(&mut self, fields: Fields) {
        self.working = fields.clone();
        self.saved = fields;
    }
}

/// Read the string `id` every remote entity carries
pub(crate) fn entity_id(resource: &'static str, fields: &Fields) -> Result<String> {
    fields
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_response(format!("{} payload has no string id", resource)))
}

/// What a proxy knows about its owning zone
///
/// The owner is held weakly: the zone's caches own the proxies, never the
/// reverse.
#[derive(Clone)]
pub(crate) struct ZoneLink {
    pub(crate) zone_id: String,
    pub(crate) service: Rc<dyn ResourceService>,
    owner: Weak<ZoneInner>,
}

impl ZoneLink {
    pub(crate) fn new(zone_id: String, service: Rc<dyn ResourceService>, owner: Weak<ZoneInner>) -> Self {
        Self {
            zone_id,
            service,
            owner,
        }
    }

    /// Drop the owning zone's `records` memo, if the zone is still alive
    pub(crate) fn invalidate_records(&self) {
        if let Some(zone) = self.owner.upgrade() {
            zone.records.invalidate();
        }
    }

    /// Drop the owning zone's `page_rules` memo, if the zone is still alive
    pub(crate) fn invalidate_page_rules(&self) {
        if let Some(zone) = self.owner.upgrade() {
            zone.page_rules.invalidate();
        }
    }
}

//! Page rule proxy

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

use super::fields::{FieldState, ZoneLink, entity_id};
use crate::error::{Error, Result};
use crate::types::{Fields, timestamp_field};

const RESOURCE: &str = "PageRule";

/// Local proxy for one page rule
///
/// Same staging contract as [`super::Record`], and likewise a handle whose
/// clones share state. The zone orders its page rules by `priority`, so
/// saving a priority change drops the zone's `page_rules` memo.
#[derive(Clone)]
pub struct PageRule {
    id: String,
    link: ZoneLink,
    fields: Rc<RefCell<FieldState>>,
}

impl PageRule {
    pub(crate) fn new(link: ZoneLink, fields: Fields) -> Result<Self> {
        Ok(Self {
            id: entity_id(RESOURCE, &fields)?,
            link,
            fields: Rc::new(RefCell::new(FieldState::new(fields))),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn zone_id(&self) -> &str {
        &self.link.zone_id
    }

    /// Read a field, seeing pending edits first
    pub fn get(&self, field: &str) -> Result<Value> {
        self.fields.borrow().get(RESOURCE, field).cloned()
    }

    /// Stage a new value for a field the server returned
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.fields
            .borrow_mut()
            .set(RESOURCE, field, value.into())
    }

    pub fn priority(&self) -> Option<i64> {
        self.get("priority").ok().as_ref().and_then(Value::as_i64)
    }

    pub fn status(&self) -> Option<String> {
        match self.get("status") {
            Ok(Value::String(status)) => Some(status),
            _ => None,
        }
    }

    pub fn targets(&self) -> Option<Vec<Value>> {
        self.array_field("targets")
    }

    pub fn actions(&self) -> Option<Vec<Value>> {
        self.array_field("actions")
    }

    pub fn modified_on(&self) -> Option<DateTime<Utc>> {
        timestamp_field(self.fields.borrow().working(), "modified_on")
    }

    pub fn fields(&self) -> Fields {
        self.fields.borrow().working().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.borrow().is_dirty()
    }

    /// Send pending edits to the server
    ///
    /// No remote call without pending edits. A changed `priority`
    /// invalidates the zone's `page_rules` memo.
    pub fn save(&self) -> Result<()> {
        let (working, previous_priority) = {
            let state = self.fields.borrow();
            if !state.is_dirty() {
                tracing::debug!(page_rule = %self.id, "Page rule unchanged, nothing to save");
                return Ok(());
            }
            (state.working().clone(), state.saved().get("priority").cloned())
        };

        tracing::info!(zone = %self.link.zone_id, page_rule = %self.id, "Updating page rule");
        let result = self
            .link
            .service
            .update_page_rule(&self.link.zone_id, &self.id, &working)?;

        let reordered = result.get("priority") != previous_priority.as_ref();
        self.fields.borrow_mut().replace(result);

        if reordered {
            self.link.invalidate_page_rules();
        }
        Ok(())
    }

    /// Delete the rule remotely and drop the zone's `page_rules` memo
    pub fn delete(&self) -> Result<()> {
        tracing::info!(zone = %self.link.zone_id, page_rule = %self.id, "Deleting page rule");
        self.link
            .service
            .delete_page_rule(&self.link.zone_id, &self.id)?;
        self.link.invalidate_page_rules();
        Ok(())
    }

    fn array_field(&self, field: &str) -> Option<Vec<Value>> {
        match self.get(field) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for PageRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PageRule <{}>", self.id)
    }
}

impl std::fmt::Debug for PageRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRule")
            .field("id", &self.id)
            .field("zone_id", &self.link.zone_id)
            .field("fields", &*self.fields.borrow())
            .finish()
    }
}

/// Request to create a page rule
///
/// Targets are either spelled out as the API's JSON objects, or generated
/// from a single URL pattern with [`NewPageRule::matching`]. Supplying both
/// is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPageRule {
    pub targets: Option<Vec<Value>>,
    pub url_matches: Option<String>,
    pub actions: Vec<Value>,
    pub priority: i64,
    pub status: String,
}

impl Default for NewPageRule {
    fn default() -> Self {
        Self {
            targets: None,
            url_matches: None,
            actions: Vec::new(),
            priority: 1,
            status: "active".to_string(),
        }
    }
}

impl NewPageRule {
    /// Rule for every URL matching `pattern`
    pub fn matching(pattern: impl Into<String>) -> Self {
        Self {
            url_matches: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Rule with explicit targets
    pub fn with_targets(targets: Vec<Value>) -> Self {
        Self {
            targets: Some(targets),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.actions
            .push(json!({ "id": id.into(), "value": value.into() }));
        self
    }

    pub fn with_actions(mut self, actions: Vec<Value>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Build the creation payload
    ///
    /// # Returns
    ///
    /// - `Ok(Fields)`: The payload to post
    /// - `Err(Error::Validation)`: Both or neither of targets and
    ///   `url_matches` were given
    pub fn to_fields(&self) -> Result<Fields> {
        let targets = match (&self.targets, &self.url_matches) {
            (Some(_), Some(_)) => {
                return Err(Error::validation(
                    "Only one of targets and url_matches can be specified",
                ));
            }
            (Some(targets), None) => targets.clone(),
            (None, Some(pattern)) => vec![json!({
                "target": "url",
                "constraint": {
                    "operator": "matches",
                    "value": pattern,
                },
            })],
            (None, None) => {
                return Err(Error::validation(
                    "One of targets and url_matches is required",
                ));
            }
        };

        let mut fields = Fields::new();
        fields.insert("targets".into(), Value::Array(targets));
        fields.insert("actions".into(), Value::Array(self.actions.clone()));
        fields.insert("priority".into(), json!(self.priority));
        fields.insert("status".into(), json!(self.status));
        Ok(fields)
    }
}

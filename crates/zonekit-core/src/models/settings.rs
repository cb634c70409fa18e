//! Zone settings with staged writes
//!
//! ## State Machine
//!
//! ```text
//! Unloaded ──first read/write──▶ Loaded ──set()──▶ Dirty
//!                                  ▲                 │
//!                                  └─────save()──────┘
//! ```
//!
//! Writes are validated against the last fetched settings (the name must
//! exist and be editable there) and then held as pending edits. `save()`
//! flushes every pending edit in one batch call and refetches.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::pagination::Paginator;
use crate::traits::ResourceService;
use crate::types::{Setting, SettingUpdate};

const RESOURCE: &str = "ZoneSettings";

#[derive(Debug, Default)]
struct SettingsState {
    /// Last fetched settings; `None` until first needed
    fetched: Option<BTreeMap<String, Setting>>,
    /// Staged values by setting name
    pending: BTreeMap<String, Value>,
}

/// The settings of one zone
pub struct ZoneSettings {
    zone_id: String,
    zone_name: String,
    service: Rc<dyn ResourceService>,
    page_size: usize,
    state: RefCell<SettingsState>,
}

impl ZoneSettings {
    pub(crate) fn new(
        zone_id: String,
        zone_name: String,
        service: Rc<dyn ResourceService>,
        page_size: usize,
    ) -> Self {
        Self {
            zone_id,
            zone_name,
            service,
            page_size,
            state: RefCell::new(SettingsState::default()),
        }
    }

    /// Read a setting's value, seeing pending edits first
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The value
    /// - `Err(Error::AttributeNotFound)`: The zone has no such setting
    pub fn get(&self, name: &str) -> Result<Value> {
        self.ensure_loaded()?;
        let state = self.state.borrow();
        if let Some(value) = state.pending.get(name) {
            return Ok(value.clone());
        }
        state
            .fetched
            .as_ref()
            .and_then(|fetched| fetched.get(name))
            .map(|setting| setting.value.clone())
            .ok_or_else(|| Error::attribute(RESOURCE, name))
    }

    /// The last fetched record of a setting, without pending edits
    pub fn setting(&self, name: &str) -> Result<Setting> {
        self.ensure_loaded()?;
        self.state
            .borrow()
            .fetched
            .as_ref()
            .and_then(|fetched| fetched.get(name))
            .cloned()
            .ok_or_else(|| Error::attribute(RESOURCE, name))
    }

    /// Stage a new value
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The edit is pending until [`ZoneSettings::save`]
    /// - `Err(Error::Validation)`: Unknown or non-editable setting
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.check_writable(name)?;
        self.state
            .borrow_mut()
            .pending
            .insert(name.to_string(), value.into());
        Ok(())
    }

    /// Whether edits are waiting for [`ZoneSettings::save`]
    pub fn is_dirty(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// Staged edits by setting name
    pub fn pending(&self) -> BTreeMap<String, Value> {
        self.state.borrow().pending.clone()
    }

    /// Flush pending edits in one batch and refetch
    ///
    /// No remote call when nothing is pending.
    pub fn save(&self) -> Result<()> {
        let items: Vec<SettingUpdate> = self
            .state
            .borrow()
            .pending
            .iter()
            .map(|(id, value)| SettingUpdate {
                id: id.clone(),
                value: value.clone(),
            })
            .collect();

        if items.is_empty() {
            tracing::debug!(zone = %self.zone_id, "No pending settings to save");
            return Ok(());
        }

        tracing::info!(zone = %self.zone_id, count = items.len(), "Saving zone settings");
        self.service.set_zone_settings(&self.zone_id, &items)?;

        let fetched = self.fetch()?;
        let mut state = self.state.borrow_mut();
        state.fetched = Some(fetched);
        state.pending.clear();
        Ok(())
    }

    /// Write one setting immediately, bypassing the pending edits
    ///
    /// Validated like [`ZoneSettings::set`]. Any pending edit of the same
    /// setting is discarded; the others stay pending.
    pub fn apply(&self, name: &str, value: impl Into<Value>) -> Result<Setting> {
        self.check_writable(name)?;

        tracing::info!(zone = %self.zone_id, setting = name, "Writing zone setting");
        let setting = self
            .service
            .set_zone_setting(&self.zone_id, name, &value.into())?;

        let fetched = self.fetch()?;
        let mut state = self.state.borrow_mut();
        state.fetched = Some(fetched);
        state.pending.remove(name);
        Ok(setting)
    }

    /// Setting names in lexicographic order
    pub fn names(&self) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        Ok(self
            .state
            .borrow()
            .fetched
            .as_ref()
            .map(|fetched| fetched.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Refetch from the server, keeping pending edits
    pub fn reload(&self) -> Result<()> {
        let fetched = self.fetch()?;
        self.state.borrow_mut().fetched = Some(fetched);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().fetched.is_some()
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        self.ensure_loaded()?;
        let state = self.state.borrow();
        match state.fetched.as_ref().and_then(|fetched| fetched.get(name)) {
            None => Err(Error::validation(format!("Not a valid setting: {}", name))),
            Some(setting) if !setting.editable => Err(Error::validation(format!(
                "Not an editable setting: {}",
                name
            ))),
            Some(_) => Ok(()),
        }
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let fetched = self.fetch()?;
        self.state.borrow_mut().fetched = Some(fetched);
        Ok(())
    }

    fn fetch(&self) -> Result<BTreeMap<String, Setting>> {
        tracing::debug!(zone = %self.zone_id, "Fetching zone settings");
        let pages = Paginator::paged(
            |page, per_page| {
                self.service
                    .list_zone_settings(&self.zone_id, page, per_page)
            },
            self.page_size,
        );

        let mut fetched = BTreeMap::new();
        for setting in pages.iter() {
            let setting = setting?;
            fetched.insert(setting.id.clone(), setting);
        }
        Ok(fetched)
    }
}

impl std::fmt::Display for ZoneSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZoneSettings<{}>", self.zone_name)
    }
}

impl std::fmt::Debug for ZoneSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ZoneSettings")
            .field("zone_id", &self.zone_id)
            .field("zone_name", &self.zone_name)
            .field("loaded", &state.fetched.is_some())
            .field("pending", &state.pending)
            .finish()
    }
}

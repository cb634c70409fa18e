//! Test doubles and common utilities for contract tests
//!
//! In-memory stand-ins for the remote services. They keep just enough state
//! to answer listings consistently and record every call so tests can
//! assert on exact remote traffic.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zonekit_core::error::{Error, RemoteError, Result};
use zonekit_core::traits::{HostService, ResourceService, ResourceServiceFactory};
use zonekit_core::types::{
    Credentials, Fields, HostUser, NewHostUser, NewZone, PurgeRequest, Setting, SettingUpdate,
    UserLookup,
};
use zonekit_core::{User, Zone};

pub const ZONE_ID: &str = "9a7806061c88ada191ed06f989cc3dac";
pub const ZONE_NAME: &str = "example.com";
pub const RECORD_ID: &str = "372e67954025e0ba6aaa6d586b9e0b59";
pub const PAGE_RULE_ID: &str = "9a7806061c88ada191ed06f989cc3dac";
pub const EMAIL: &str = "foo@example.net";
pub const API_KEY: &str = "c2547eb745079dac9320b638f5e225cf483cc5cfdda41";

/// One recorded remote call
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub payload: Value,
}

#[derive(Debug, Clone)]
struct FakeZone {
    fields: Fields,
    records: Vec<Fields>,
    page_rules: Vec<Fields>,
    settings: Vec<Setting>,
}

#[derive(Debug, Default)]
struct FakeState {
    zones: Vec<FakeZone>,
    next_id: usize,
    ssl_error_code: Option<i64>,
    failing_record_page: Option<u64>,
}

impl FakeState {
    fn zone(&self, zone_id: &str) -> Result<&FakeZone> {
        self.zones
            .iter()
            .find(|z| z.fields["id"] == zone_id)
            .ok_or_else(|| Error::not_found(format!("zone {}", zone_id)))
    }

    fn zone_mut(&mut self, zone_id: &str) -> Result<&mut FakeZone> {
        self.zones
            .iter_mut()
            .find(|z| z.fields["id"] == zone_id)
            .ok_or_else(|| Error::not_found(format!("zone {}", zone_id)))
    }

    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:032x}", self.next_id)
    }
}

/// In-memory Resource Service
pub struct FakeService {
    state: Arc<Mutex<FakeState>>,
    calls: Arc<Mutex<Vec<Call>>>,
    /// Call counter across every method
    call_count: Arc<AtomicUsize>,
}

impl FakeService {
    /// A service with no zones at all
    pub fn empty() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A service holding `example.com` with one A record, one page rule and
    /// four settings (`advanced_ddos` is not editable)
    pub fn with_example_zone() -> Self {
        let service = Self::empty();
        service.add_zone(ZONE_ID, ZONE_NAME);
        service.add_record(
            ZONE_ID,
            record_fields(RECORD_ID, "example.com", "A", "1.2.3.4"),
        );
        service.add_page_rule(ZONE_ID, page_rule_fields(PAGE_RULE_ID, 1, "active"));
        service
    }

    /// Create a new FakeService that shares state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
            calls: Arc::clone(&other.calls),
            call_count: Arc::clone(&other.call_count),
        }
    }

    pub fn add_zone(&self, id: &str, name: &str) {
        let fields = object(json!({
            "id": id,
            "name": name,
            "status": "active",
            "paused": false,
            "name_servers": ["jim.ns.cloudflare.com", "lola.ns.cloudflare.com"],
            "plan": {"id": "free", "name": "Free Website"},
        }));
        self.state.lock().unwrap().zones.push(FakeZone {
            fields,
            records: Vec::new(),
            page_rules: Vec::new(),
            settings: default_settings(),
        });
    }

    pub fn add_record(&self, zone_id: &str, record: Fields) {
        let mut state = self.state.lock().unwrap();
        state.zone_mut(zone_id).unwrap().records.push(record);
    }

    pub fn add_page_rule(&self, zone_id: &str, rule: Fields) {
        let mut state = self.state.lock().unwrap();
        state.zone_mut(zone_id).unwrap().page_rules.push(rule);
    }

    /// Make `get_ssl_verification_info` fail with `code`
    pub fn fail_ssl_with(&self, code: i64) {
        self.state.lock().unwrap().ssl_error_code = Some(code);
    }

    /// Make `list_dns_records` fail for `page`
    pub fn fail_record_page(&self, page: u64) {
        self.state.lock().unwrap().failing_record_page = Some(page);
    }

    /// Number of remote calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of calls made to `method`
    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Payload of the latest call to `method`
    pub fn last_payload(&self, method: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.method == method)
            .map(|c| c.payload.clone())
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Records currently stored for a zone, bypassing the call log
    pub fn stored_records(&self, zone_id: &str) -> Vec<Fields> {
        let state = self.state.lock().unwrap();
        state.zone(zone_id).map(|z| z.records.clone()).unwrap_or_default()
    }

    pub fn stored_zone_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .zones
            .iter()
            .filter_map(|z| z.fields["name"].as_str().map(str::to_string))
            .collect()
    }

    fn record(&self, method: &'static str, payload: Value) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call { method, payload });
    }
}

fn page_of<T: Clone>(items: &[T], page: u64, per_page: usize) -> Vec<T> {
    let start = ((page.saturating_sub(1)) as usize * per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    items[start..end].to_vec()
}

fn find_by_id<'a>(items: &'a mut [Fields], id: &str, what: &str) -> Result<&'a mut Fields> {
    items
        .iter_mut()
        .find(|f| f["id"] == id)
        .ok_or_else(|| Error::not_found(format!("{} {}", what, id)))
}

impl ResourceService for FakeService {
    fn list_zones(&self, page: u64, per_page: usize) -> Result<Vec<Fields>> {
        self.record("list_zones", json!({"page": page, "per_page": per_page}));
        let state = self.state.lock().unwrap();
        let zones: Vec<Fields> = state.zones.iter().map(|z| z.fields.clone()).collect();
        Ok(page_of(&zones, page, per_page))
    }

    fn get_zone(&self, zone_id: &str) -> Result<Fields> {
        self.record("get_zone", json!(zone_id));
        Ok(self.state.lock().unwrap().zone(zone_id)?.fields.clone())
    }

    fn get_zone_by_name(&self, name: &str) -> Result<Fields> {
        self.record("get_zone_by_name", json!(name));
        let state = self.state.lock().unwrap();
        state
            .zones
            .iter()
            .find(|z| z.fields["name"] == name)
            .map(|z| z.fields.clone())
            .ok_or_else(|| Error::not_found(format!("zone named {}", name)))
    }

    fn create_zone(&self, zone: &NewZone) -> Result<Fields> {
        self.record("create_zone", serde_json::to_value(zone)?);
        if self.stored_zone_names().contains(&zone.name) {
            return Err(RemoteError::new("Zone creation failed")
                .with_status(400)
                .with_error(1061, format!("{} already exists", zone.name))
                .into());
        }
        let id = self.state.lock().unwrap().fresh_id();
        self.add_zone(&id, &zone.name);
        let mut state = self.state.lock().unwrap();
        let created = state.zone_mut(&id)?;
        created.fields.insert("status".into(), json!("pending"));
        Ok(created.fields.clone())
    }

    fn delete_zone(&self, zone_id: &str) -> Result<()> {
        self.record("delete_zone", json!(zone_id));
        let mut state = self.state.lock().unwrap();
        state.zone(zone_id)?;
        state.zones.retain(|z| z.fields["id"] != zone_id);
        Ok(())
    }

    fn list_zone_settings(&self, zone_id: &str, page: u64, per_page: usize) -> Result<Vec<Setting>> {
        self.record(
            "list_zone_settings",
            json!({"zone": zone_id, "page": page, "per_page": per_page}),
        );
        let state = self.state.lock().unwrap();
        Ok(page_of(&state.zone(zone_id)?.settings, page, per_page))
    }

    fn set_zone_settings(&self, zone_id: &str, items: &[SettingUpdate]) -> Result<Vec<Setting>> {
        self.record("set_zone_settings", serde_json::to_value(items)?);
        let mut state = self.state.lock().unwrap();
        let zone = state.zone_mut(zone_id)?;
        for item in items {
            apply_setting(&mut zone.settings, &item.id, &item.value)?;
        }
        Ok(zone.settings.clone())
    }

    fn set_zone_setting(&self, zone_id: &str, setting_id: &str, value: &Value) -> Result<Setting> {
        self.record(
            "set_zone_setting",
            json!({"id": setting_id, "value": value}),
        );
        let mut state = self.state.lock().unwrap();
        let zone = state.zone_mut(zone_id)?;
        apply_setting(&mut zone.settings, setting_id, value)
    }

    fn list_dns_records(&self, zone_id: &str, page: u64, per_page: usize) -> Result<Vec<Fields>> {
        self.record(
            "list_dns_records",
            json!({"zone": zone_id, "page": page, "per_page": per_page}),
        );
        let state = self.state.lock().unwrap();
        if state.failing_record_page == Some(page) {
            return Err(RemoteError::new("Internal error").with_status(500).into());
        }
        Ok(page_of(&state.zone(zone_id)?.records, page, per_page))
    }

    fn create_dns_record(&self, zone_id: &str, fields: &Fields) -> Result<Fields> {
        self.record("create_dns_record", Value::Object(fields.clone()));
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        let mut created = fields.clone();
        created.insert("id".into(), json!(id));
        created.insert("zone_id".into(), json!(zone_id));
        created.insert("locked".into(), json!(false));
        created.insert("created_on".into(), json!("2014-01-01T05:20:00.12345Z"));
        created.insert("modified_on".into(), json!("2014-01-01T05:20:00.12345Z"));
        state.zone_mut(zone_id)?.records.push(created.clone());
        Ok(created)
    }

    fn update_dns_record(&self, zone_id: &str, record_id: &str, fields: &Fields) -> Result<Fields> {
        self.record("update_dns_record", Value::Object(fields.clone()));
        let mut state = self.state.lock().unwrap();
        let zone = state.zone_mut(zone_id)?;
        let stored = find_by_id(&mut zone.records, record_id, "record")?;
        *stored = fields.clone();
        stored.insert("modified_on".into(), json!("2014-01-02T05:20:00.12345Z"));
        Ok(stored.clone())
    }

    fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.record("delete_dns_record", json!(record_id));
        let mut state = self.state.lock().unwrap();
        let zone = state.zone_mut(zone_id)?;
        find_by_id(&mut zone.records, record_id, "record")?;
        zone.records.retain(|r| r["id"] != record_id);
        Ok(())
    }

    fn list_page_rules(&self, zone_id: &str, page: u64, per_page: usize) -> Result<Vec<Fields>> {
        self.record(
            "list_page_rules",
            json!({"zone": zone_id, "page": page, "per_page": per_page}),
        );
        let state = self.state.lock().unwrap();
        Ok(page_of(&state.zone(zone_id)?.page_rules, page, per_page))
    }

    fn create_page_rule(&self, zone_id: &str, fields: &Fields) -> Result<Fields> {
        self.record("create_page_rule", Value::Object(fields.clone()));
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        let mut created = fields.clone();
        created.insert("id".into(), json!(id));
        created.insert("created_on".into(), json!("2014-01-01T05:20:00.12345Z"));
        created.insert("modified_on".into(), json!("2014-01-01T05:20:00.12345Z"));
        state.zone_mut(zone_id)?.page_rules.push(created.clone());
        Ok(created)
    }

    fn update_page_rule(&self, zone_id: &str, rule_id: &str, fields: &Fields) -> Result<Fields> {
        self.record("update_page_rule", Value::Object(fields.clone()));
        let mut state = self.state.lock().unwrap();
        let zone = state.zone_mut(zone_id)?;
        let stored = find_by_id(&mut zone.page_rules, rule_id, "page rule")?;
        *stored = fields.clone();
        Ok(stored.clone())
    }

    fn delete_page_rule(&self, zone_id: &str, rule_id: &str) -> Result<()> {
        self.record("delete_page_rule", json!(rule_id));
        let mut state = self.state.lock().unwrap();
        let zone = state.zone_mut(zone_id)?;
        find_by_id(&mut zone.page_rules, rule_id, "page rule")?;
        zone.page_rules.retain(|r| r["id"] != rule_id);
        Ok(())
    }

    fn purge_cache(&self, zone_id: &str, request: &PurgeRequest) -> Result<()> {
        let payload = match request {
            PurgeRequest::Everything => json!({"purge_everything": true}),
            PurgeRequest::Selective { files, tags } => json!({"files": files, "tags": tags}),
        };
        self.record("purge_cache", payload);
        self.state.lock().unwrap().zone(zone_id)?;
        Ok(())
    }

    fn get_ssl_verification_info(&self, zone_id: &str) -> Result<Value> {
        self.record("get_ssl_verification_info", json!(zone_id));
        let state = self.state.lock().unwrap();
        if let Some(code) = state.ssl_error_code {
            return Err(RemoteError::new("SSL verification failed")
                .with_status(400)
                .with_error(code, "SSL verification is not available")
                .into());
        }
        state.zone(zone_id)?;
        Ok(json!([{
            "certificate_status": "active",
            "verification_type": "cname",
            "verification_status": true,
        }]))
    }
}

fn apply_setting(settings: &mut [Setting], id: &str, value: &Value) -> Result<Setting> {
    let setting = settings
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| RemoteError::new(format!("Unknown setting {}", id)).with_status(400))?;
    if !setting.editable {
        return Err(RemoteError::new(format!("Setting {} is read-only", id))
            .with_status(400)
            .with_error(1007, "Setting not editable")
            .into());
    }
    setting.value = value.clone();
    Ok(setting.clone())
}

fn default_settings() -> Vec<Setting> {
    vec![
        setting("advanced_ddos", json!("on"), false),
        setting("always_online", json!("on"), true),
        setting("development_mode", json!("off"), true),
        setting(
            "minify",
            json!({"css": "off", "html": "off", "js": "off"}),
            true,
        ),
    ]
}

fn setting(id: &str, value: Value, editable: bool) -> Setting {
    Setting {
        id: id.to_string(),
        value,
        editable,
        modified_on: None,
    }
}

pub fn object(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn record_fields(id: &str, name: &str, record_type: &str, content: &str) -> Fields {
    object(json!({
        "id": id,
        "type": record_type,
        "name": name,
        "content": content,
        "proxiable": true,
        "proxied": false,
        "ttl": 120,
        "locked": false,
        "zone_id": ZONE_ID,
        "zone_name": ZONE_NAME,
        "created_on": "2014-01-01T05:20:00.12345Z",
        "modified_on": "2014-01-01T05:20:00.12345Z",
    }))
}

pub fn page_rule_fields(id: &str, priority: i64, status: &str) -> Fields {
    object(json!({
        "id": id,
        "targets": [{
            "target": "url",
            "constraint": {"operator": "matches", "value": "*example.com/images/*"},
        }],
        "actions": [{"id": "always_online", "value": "on"}],
        "priority": priority,
        "status": status,
        "created_on": "2014-01-01T05:20:00.12345Z",
        "modified_on": "2014-01-01T05:20:00.12345Z",
    }))
}

/// Build a user over a fresh handle to `fake`
pub fn user_over(fake: &FakeService) -> User {
    User::new(EMAIL, API_KEY, Rc::new(FakeService::sharing_counters_with(fake)))
}

/// The example zone, fetched through a user over `fake`
pub fn example_zone(fake: &FakeService) -> (User, Zone) {
    let user = user_over(fake);
    let zone = user.get_zone_by_name(ZONE_NAME).unwrap();
    fake.reset_calls();
    (user, zone)
}

/// In-memory Host Service
///
/// Zones it sets up are created in the linked [`FakeService`], already
/// holding two records the way the Host API pre-populates them.
pub struct FakeHostService {
    resources: FakeService,
    users: Arc<Mutex<HashMap<String, HostUser>>>,
    hosted: Arc<Mutex<Vec<Value>>>,
    user_create_count: Arc<AtomicUsize>,
    user_lookup_count: Arc<AtomicUsize>,
    zone_list_calls: Arc<Mutex<Vec<(u64, usize)>>>,
}

impl FakeHostService {
    pub fn new(resources: &FakeService) -> Self {
        Self {
            resources: FakeService::sharing_counters_with(resources),
            users: Arc::new(Mutex::new(HashMap::new())),
            hosted: Arc::new(Mutex::new(Vec::new())),
            user_create_count: Arc::new(AtomicUsize::new(0)),
            user_lookup_count: Arc::new(AtomicUsize::new(0)),
            zone_list_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a user as already known to the host
    pub fn add_user(&self, email: &str, unique_id: Option<&str>) -> HostUser {
        let user = HostUser {
            cloudflare_email: email.to_string(),
            cloudflare_username: None,
            unique_id: unique_id.map(str::to_string),
            user_api_key: API_KEY.to_string(),
            user_key: format!("user-key-{}", email),
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), user.clone());
        user
    }

    pub fn add_hosted_zones(&self, count: usize) {
        let mut hosted = self.hosted.lock().unwrap();
        for i in 0..count {
            hosted.push(json!({"zone_name": format!("hosted{}.example.org", i)}));
        }
    }

    pub fn user_create_count(&self) -> usize {
        self.user_create_count.load(Ordering::SeqCst)
    }

    pub fn user_lookup_count(&self) -> usize {
        self.user_lookup_count.load(Ordering::SeqCst)
    }

    /// `(offset, limit)` of every `zone_list` call
    pub fn zone_list_calls(&self) -> Vec<(u64, usize)> {
        self.zone_list_calls.lock().unwrap().clone()
    }

    /// Create a new FakeHostService that shares state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            resources: FakeService::sharing_counters_with(&other.resources),
            users: Arc::clone(&other.users),
            hosted: Arc::clone(&other.hosted),
            user_create_count: Arc::clone(&other.user_create_count),
            user_lookup_count: Arc::clone(&other.user_lookup_count),
            zone_list_calls: Arc::clone(&other.zone_list_calls),
        }
    }

    fn check_user_key(&self, user_key: &str) -> Result<()> {
        let known = self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|u| u.user_key == user_key);
        if known {
            Ok(())
        } else {
            Err(RemoteError::new("Invalid user_key").with_error(103, "user_key invalid").into())
        }
    }
}

impl HostService for FakeHostService {
    fn user_create(&self, user: &NewHostUser) -> Result<HostUser> {
        self.user_create_count.fetch_add(1, Ordering::SeqCst);
        if let Some(existing) = self.users.lock().unwrap().get(&user.email) {
            return Ok(existing.clone());
        }
        let mut created = self.add_user(&user.email, user.unique_id.as_deref());
        created.cloudflare_username = user.username.clone();
        self.users
            .lock()
            .unwrap()
            .insert(user.email.clone(), created.clone());
        Ok(created)
    }

    fn user_lookup(&self, lookup: &UserLookup) -> Result<HostUser> {
        self.user_lookup_count.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        let found = match lookup {
            UserLookup::Email(email) => users.get(email).cloned(),
            UserLookup::UniqueId(id) => users
                .values()
                .find(|u| u.unique_id.as_deref() == Some(id.as_str()))
                .cloned(),
        };
        found.ok_or_else(|| Error::not_found(format!("host user {:?}", lookup)))
    }

    fn zone_list(&self, offset: u64, limit: usize) -> Result<Vec<Value>> {
        self.zone_list_calls.lock().unwrap().push((offset, limit));
        let hosted = self.hosted.lock().unwrap();
        let start = (offset as usize).min(hosted.len());
        let end = (start + limit).min(hosted.len());
        Ok(hosted[start..end].to_vec())
    }

    fn full_zone_set(&self, zone_name: &str, user_key: &str, jump_start: bool) -> Result<Value> {
        self.check_user_key(user_key)?;
        let id = format!("{:032x}", zone_name.len() + 0xf00d);
        self.resources.add_zone(&id, zone_name);
        self.resources.add_record(
            &id,
            record_fields("prepopulated-a", zone_name, "A", "192.0.2.1"),
        );
        self.resources.add_record(
            &id,
            record_fields("prepopulated-cname", &format!("www.{}", zone_name), "CNAME", zone_name),
        );
        Ok(json!({
            "zone_name": zone_name,
            "jump_start": jump_start,
            "msg": null,
        }))
    }

    fn zone_set(
        &self,
        zone_name: &str,
        user_key: &str,
        subdomains: &[String],
        resolve_to: &str,
    ) -> Result<Value> {
        self.check_user_key(user_key)?;
        let forward_tos: serde_json::Map<String, Value> = subdomains
            .iter()
            .map(|sub| {
                (
                    format!("{}.{}", sub, zone_name),
                    json!(format!("{}.{}.cdn.cloudflare.net", sub, zone_name)),
                )
            })
            .collect();
        Ok(json!({
            "zone_name": zone_name,
            "resolving_to": resolve_to,
            "hosted_cnames": subdomains,
            "forward_tos": forward_tos,
        }))
    }
}

/// Factory handing out services that share the linked fake's state
pub struct FakeFactory {
    resources: FakeService,
    seen: Arc<Mutex<Vec<Credentials>>>,
}

impl FakeFactory {
    pub fn new(resources: &FakeService) -> Self {
        Self {
            resources: FakeService::sharing_counters_with(resources),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Credentials passed to every `create` call
    pub fn seen(&self) -> Vec<Credentials> {
        self.seen.lock().unwrap().clone()
    }
}

impl ResourceServiceFactory for FakeFactory {
    fn create(&self, credentials: &Credentials) -> Result<Rc<dyn ResourceService>> {
        self.seen.lock().unwrap().push(credentials.clone());
        Ok(Rc::new(FakeService::sharing_counters_with(&self.resources)))
    }
}

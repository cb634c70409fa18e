//! Zone aggregate

use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::fields::{ZoneLink, entity_id};
use super::page_rule::{NewPageRule, PageRule};
use super::record::{NewRecord, Record};
use super::settings::ZoneSettings;
use super::user::UserInner;
use crate::cache::CollectionCache;
use crate::error::{Error, Result, SSL_UNAVAILABLE_CODE, translate_errors};
use crate::pagination::Paginator;
use crate::traits::ResourceService;
use crate::types::{Fields, PurgeRequest};

const RESOURCE: &str = "Zone";

/// Records of a zone grouped by name, each group sorted by (type, content)
pub type RecordMap = BTreeMap<String, Vec<Record>>;

/// A zone and everything hanging off it
///
/// `Zone` is a cheap handle: clones share the same caches. The attribute
/// bag is the one fetched when the zone was constructed and is never
/// refreshed.
#[derive(Clone)]
pub struct Zone {
    inner: Rc<ZoneInner>,
}

pub(crate) struct ZoneInner {
    id: String,
    data: Fields,
    service: Rc<dyn ResourceService>,
    user: Weak<UserInner>,
    page_size: usize,
    settings: ZoneSettings,
    pub(crate) records: CollectionCache<RecordMap>,
    pub(crate) page_rules: CollectionCache<Vec<PageRule>>,
}

impl Zone {
    /// Wrap a zone payload returned by the Resource Service
    pub(crate) fn from_fields(
        service: Rc<dyn ResourceService>,
        user: Weak<UserInner>,
        page_size: usize,
        data: Fields,
    ) -> Result<Self> {
        let id = entity_id(RESOURCE, &data)?;
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_response(format!("Zone {} has no name", id)))?
            .to_string();

        Ok(Self {
            inner: Rc::new(ZoneInner {
                settings: ZoneSettings::new(id.clone(), name, Rc::clone(&service), page_size),
                id,
                data,
                service,
                user,
                page_size,
                records: CollectionCache::new("records"),
                page_rules: CollectionCache::new("page_rules"),
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Domain name of the zone
    pub fn name(&self) -> &str {
        // Presence checked in `from_fields`
        self.inner
            .data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Read one provider attribute (`status`, `plan`, `name_servers`, ...)
    ///
    /// # Returns
    ///
    /// - `Ok(&Value)`: The attribute as fetched at construction
    /// - `Err(Error::AttributeNotFound)`: The zone payload has no such key
    pub fn attr(&self, name: &str) -> Result<&Value> {
        self.inner
            .data
            .get(name)
            .ok_or_else(|| Error::attribute(RESOURCE, name))
    }

    /// The whole attribute bag
    pub fn data(&self) -> &Fields {
        &self.inner.data
    }

    pub fn status(&self) -> Option<&str> {
        self.attr("status").ok().and_then(Value::as_str)
    }

    pub fn name_servers(&self) -> Vec<String> {
        self.attr("name_servers")
            .ok()
            .and_then(Value::as_array)
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn settings(&self) -> &ZoneSettings {
        &self.inner.settings
    }

    /// Lazy, uncached sequence over the zone's DNS records
    pub fn iter_records(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        let pages = Paginator::paged(
            move |page, per_page| {
                self.inner
                    .service
                    .list_dns_records(&self.inner.id, page, per_page)
            },
            self.inner.page_size,
        );
        pages
            .into_iter()
            .map(move |fields| fields.and_then(|fields| Record::new(self.link(), fields)))
    }

    /// Records grouped by name, memoized until a membership change
    pub fn records(&self) -> Result<Rc<RecordMap>> {
        self.inner.records.get_or_load(|| {
            let mut grouped = RecordMap::new();
            for record in self.iter_records() {
                let record = record?;
                let name = record.name().unwrap_or_default();
                grouped.entry(name).or_default().push(record);
            }
            for group in grouped.values_mut() {
                group.sort_by_cached_key(|record| (record.record_type(), record.content()));
            }
            Ok(grouped)
        })
    }

    /// Create a DNS record and drop the `records` memo
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: Proxy over the server's answer
    /// - `Err(Error::Validation)`: The request misses a field its type needs;
    ///   nothing was sent
    pub fn create_record(&self, record: &NewRecord) -> Result<Record> {
        let fields = record.to_fields()?;

        tracing::info!(
            zone = %self.inner.id,
            name = %record.name,
            record_type = %record.record_type,
            "Creating DNS record"
        );
        let created = self
            .inner
            .service
            .create_dns_record(&self.inner.id, &fields)?;
        self.inner.records.invalidate();

        Record::new(self.link(), created)
    }

    /// Lazy, uncached sequence over the zone's page rules
    pub fn iter_page_rules(&self) -> impl Iterator<Item = Result<PageRule>> + '_ {
        let pages = Paginator::paged(
            move |page, per_page| {
                self.inner
                    .service
                    .list_page_rules(&self.inner.id, page, per_page)
            },
            self.inner.page_size,
        );
        pages
            .into_iter()
            .map(move |fields| fields.and_then(|fields| PageRule::new(self.link(), fields)))
    }

    /// Page rules in ascending priority, memoized until a reorder
    pub fn page_rules(&self) -> Result<Rc<Vec<PageRule>>> {
        self.inner.page_rules.get_or_load(|| {
            let mut rules = self.iter_page_rules().collect::<Result<Vec<_>>>()?;
            rules.sort_by_key(|rule| rule.priority().unwrap_or_default());
            Ok(rules)
        })
    }

    /// Create a page rule and drop the `page_rules` memo
    pub fn create_page_rule(&self, rule: &NewPageRule) -> Result<PageRule> {
        let fields = rule.to_fields()?;

        tracing::info!(zone = %self.inner.id, priority = rule.priority, "Creating page rule");
        let created = self
            .inner
            .service
            .create_page_rule(&self.inner.id, &fields)?;
        self.inner.page_rules.invalidate();

        PageRule::new(self.link(), created)
    }

    /// Purge cached content; with neither files nor tags, everything
    pub fn purge_cache(&self, files: Option<Vec<String>>, tags: Option<Vec<String>>) -> Result<()> {
        let request = PurgeRequest::from_parts(files, tags);
        tracing::info!(zone = %self.inner.id, request = ?request, "Purging cache");
        self.inner.service.purge_cache(&self.inner.id, &request)
    }

    /// SSL verification details for the zone
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The verification info
    /// - `Err(Error::SslUnavailable)`: The provider reported code 1001
    /// - `Err(Error::Remote)`: Any other remote failure, unchanged
    pub fn get_ssl_verification_info(&self) -> Result<Value> {
        translate_errors(SSL_UNAVAILABLE_CODE, Error::SslUnavailable, || {
            self.inner.service.get_ssl_verification_info(&self.inner.id)
        })
    }

    /// Delete the zone remotely and drop the owning user's `zones` memo
    pub fn delete(&self) -> Result<()> {
        tracing::info!(zone = %self.inner.id, name = %self.name(), "Deleting zone");
        self.inner.service.delete_zone(&self.inner.id)?;
        if let Some(user) = self.inner.user.upgrade() {
            user.zones.invalidate();
        }
        Ok(())
    }

    fn link(&self) -> ZoneLink {
        ZoneLink::new(
            self.inner.id.clone(),
            Rc::clone(&self.inner.service),
            Rc::downgrade(&self.inner),
        )
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone<{}>", self.name())
    }
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("records", &self.inner.records)
            .field("page_rules", &self.inner.page_rules)
            .finish()
    }
}

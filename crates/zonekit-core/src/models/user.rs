//! User aggregate

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use super::zone::Zone;
use crate::cache::CollectionCache;
use crate::error::{Error, Result};
use crate::pagination::{DEFAULT_PAGE_SIZE, Paginator};
use crate::traits::{HostService, ResourceService};
use crate::types::{HostUser, NewZone, UserLookup};

/// An account and the zones it owns
///
/// Cheap handle; clones share the `zones` memo and the host record.
#[derive(Clone)]
pub struct User {
    inner: Rc<UserInner>,
}

pub(crate) struct UserInner {
    email: String,
    api_key: String,
    service: Rc<dyn ResourceService>,
    host: Option<Rc<dyn HostService>>,
    host_data: RefCell<Option<HostUser>>,
    page_size: usize,
    pub(crate) zones: CollectionCache<Vec<Zone>>,
}

/// Builder for [`User`]
pub struct UserBuilder {
    email: String,
    api_key: String,
    service: Rc<dyn ResourceService>,
    host: Option<Rc<dyn HostService>>,
    host_data: Option<HostUser>,
    page_size: usize,
}

impl UserBuilder {
    /// Host Service used for host-key operations
    pub fn with_host(mut self, host: Rc<dyn HostService>) -> Self {
        self.host = Some(host);
        self
    }

    /// Host record already known, so no lookup is needed
    pub fn with_host_data(mut self, data: HostUser) -> Self {
        self.host_data = Some(data);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn build(self) -> User {
        User {
            inner: Rc::new(UserInner {
                email: self.email,
                api_key: self.api_key,
                service: self.service,
                host: self.host,
                host_data: RefCell::new(self.host_data),
                page_size: self.page_size,
                zones: CollectionCache::new("zones"),
            }),
        }
    }
}

impl User {
    /// User bound to an already constructed Resource Service
    pub fn new(
        email: impl Into<String>,
        api_key: impl Into<String>,
        service: Rc<dyn ResourceService>,
    ) -> Self {
        Self::builder(email, api_key, service).build()
    }

    pub fn builder(
        email: impl Into<String>,
        api_key: impl Into<String>,
        service: Rc<dyn ResourceService>,
    ) -> UserBuilder {
        UserBuilder {
            email: email.into(),
            api_key: api_key.into(),
            service,
            host: None,
            host_data: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn email(&self) -> &str {
        &self.inner.email
    }

    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// The user's record on the Host Service
    ///
    /// Looked up by email on first access unless supplied at construction,
    /// then memoized.
    ///
    /// # Returns
    ///
    /// - `Ok(HostUser)`: The host record
    /// - `Err(Error::Config)`: The user was built without a Host Service
    pub fn host_data(&self) -> Result<HostUser> {
        if let Some(data) = self.inner.host_data.borrow().as_ref() {
            return Ok(data.clone());
        }

        tracing::debug!(email = %self.inner.email, "Looking up host record");
        let data = self
            .host()?
            .user_lookup(&UserLookup::Email(self.inner.email.clone()))?;
        *self.inner.host_data.borrow_mut() = Some(data.clone());
        Ok(data)
    }

    /// Host-side key identifying the user to the Host Service
    pub fn user_key(&self) -> Result<String> {
        Ok(self.host_data()?.user_key)
    }

    pub fn unique_id(&self) -> Result<Option<String>> {
        Ok(self.host_data()?.unique_id)
    }

    /// Lazy, uncached sequence over the user's zones
    pub fn iter_zones(&self) -> impl Iterator<Item = Result<Zone>> + '_ {
        let pages = Paginator::paged(
            move |page, per_page| self.inner.service.list_zones(page, per_page),
            self.inner.page_size,
        );
        pages
            .into_iter()
            .map(move |fields| fields.and_then(|fields| self.wrap_zone(fields)))
    }

    /// Zones in server order, memoized until a zone is created or deleted
    pub fn zones(&self) -> Result<Rc<Vec<Zone>>> {
        self.inner
            .zones
            .get_or_load(|| self.iter_zones().collect())
    }

    /// Fetch one zone by id
    ///
    /// Not memoized; every call reaches the Resource Service.
    pub fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        let fields = self.inner.service.get_zone(zone_id)?;
        self.wrap_zone(fields)
    }

    /// Fetch one zone by domain name
    ///
    /// # Returns
    ///
    /// - `Ok(Zone)`: The zone
    /// - `Err(Error::NotFound)`: The user has no zone with this name
    pub fn get_zone_by_name(&self, name: &str) -> Result<Zone> {
        let fields = self.inner.service.get_zone_by_name(name)?;
        self.wrap_zone(fields)
    }

    /// Create a zone and drop the `zones` memo
    pub fn create_zone(&self, zone: &NewZone) -> Result<Zone> {
        tracing::info!(email = %self.inner.email, zone = %zone.name, "Creating zone");
        let created = self.inner.service.create_zone(zone)?;
        self.inner.zones.invalidate();
        self.wrap_zone(created)
    }

    /// Create a full zone through the Host Service
    ///
    /// The Host Service pre-populates new zones with records of its own;
    /// they are all deleted before the zone is returned.
    pub fn create_host_zone(&self, name: &str, jump_start: bool) -> Result<Zone> {
        let host = self.host()?;
        let user_key = self.user_key()?;

        tracing::info!(email = %self.inner.email, zone = name, "Creating host zone");
        host.full_zone_set(name, &user_key, jump_start)?;
        self.inner.zones.invalidate();

        let zone = self.get_zone_by_name(name)?;
        // Collect first: deleting while paging would shift later pages
        let prepopulated = zone.iter_records().collect::<Result<Vec<_>>>()?;
        tracing::debug!(zone = name, count = prepopulated.len(), "Removing pre-populated records");
        for record in &prepopulated {
            record.delete()?;
        }
        Ok(zone)
    }

    /// Create a CNAME-setup zone through the Host Service
    ///
    /// Returns the Host Service answer unchanged.
    pub fn create_cname_zone(
        &self,
        name: &str,
        subdomains: &[String],
        resolve_to: &str,
    ) -> Result<Value> {
        let host = self.host()?;
        let user_key = self.user_key()?;

        tracing::info!(email = %self.inner.email, zone = name, "Creating CNAME zone");
        let result = host.zone_set(name, &user_key, subdomains, resolve_to)?;
        self.inner.zones.invalidate();
        Ok(result)
    }

    /// Force the next `zones()` call to refetch
    pub fn invalidate_zones(&self) {
        self.inner.zones.invalidate();
    }

    fn host(&self) -> Result<Rc<dyn HostService>> {
        self.inner
            .host
            .clone()
            .ok_or_else(|| Error::config(format!("User {} has no host service", self.inner.email)))
    }

    fn wrap_zone(&self, fields: crate::types::Fields) -> Result<Zone> {
        Zone::from_fields(
            Rc::clone(&self.inner.service),
            Rc::downgrade(&self.inner),
            self.inner.page_size,
            fields,
        )
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "User<{}>", self.inner.email)
    }
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("email", &self.inner.email)
            .field("api_key", &"<REDACTED>")
            .field("has_host", &self.inner.host.is_some())
            .field("zones", &self.inner.zones)
            .finish()
    }
}

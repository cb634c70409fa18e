//! Host-level entry point
//!
//! A [`Host`] provisions and finds users through the Host Service and binds
//! each one to a Resource Service built by the injected factory.

use serde_json::Value;
use std::rc::Rc;

use super::user::User;
use crate::error::Result;
use crate::pagination::Paginator;
use crate::traits::{HostService, ResourceServiceFactory};
use crate::types::{Credentials, HostUser, NewHostUser, UserLookup};

/// Page size for listing hosted zones
pub const DEFAULT_HOST_PAGE_SIZE: usize = 100;

pub struct Host {
    service: Rc<dyn HostService>,
    factory: Rc<dyn ResourceServiceFactory>,
    page_size: usize,
    user_page_size: Option<usize>,
}

impl Host {
    pub fn new(service: Rc<dyn HostService>, factory: Rc<dyn ResourceServiceFactory>) -> Self {
        Self {
            service,
            factory,
            page_size: DEFAULT_HOST_PAGE_SIZE,
            user_page_size: None,
        }
    }

    /// Page size of the hosted zone listing
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Page size handed to the users this host builds
    pub fn with_user_page_size(mut self, page_size: usize) -> Self {
        self.user_page_size = Some(page_size);
        self
    }

    /// Provision a user, or fetch it if the Host Service already knows it
    pub fn get_or_create_user(&self, user: &NewHostUser) -> Result<User> {
        tracing::info!(email = %user.email, "Provisioning host user");
        let data = self.service.user_create(user)?;
        self.user_from_host_data(data)
    }

    /// Find an existing user by email or unique id
    pub fn get_user(&self, lookup: &UserLookup) -> Result<User> {
        tracing::debug!(lookup = ?lookup, "Looking up host user");
        let data = self.service.user_lookup(lookup)?;
        self.user_from_host_data(data)
    }

    /// Build a user from a host record, which is kept on the user
    pub fn user_from_host_data(&self, data: HostUser) -> Result<User> {
        let credentials = Credentials::ApiKey {
            email: data.cloudflare_email.clone(),
            api_key: data.user_api_key.clone(),
        };
        let service = self.factory.create(&credentials)?;

        let mut builder = User::builder(
            data.cloudflare_email.clone(),
            data.user_api_key.clone(),
            service,
        )
        .with_host(Rc::clone(&self.service))
        .with_host_data(data);
        if let Some(page_size) = self.user_page_size {
            builder = builder.with_page_size(page_size);
        }
        Ok(builder.build())
    }

    /// Lazy sequence over every zone hosted under the host key
    pub fn iter_zones(&self) -> impl Iterator<Item = Result<Value>> + '_ {
        Paginator::offset(
            move |offset, limit| self.service.zone_list(offset, limit),
            self.page_size,
        )
        .into_iter()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("page_size", &self.page_size)
            .field("user_page_size", &self.user_page_size)
            .finish()
    }
}

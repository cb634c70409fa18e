// # Resource Service Trait
//
// Defines the interface every remote read/write of the object model goes
// through.
//
// ## Implementations
//
// - Cloudflare v4: `zonekit-cloudflare` crate
// - In-memory fakes: `tests/common` of this crate
//
// ## Usage
//
// ```rust,ignore
// use zonekit_core::ResourceService;
//
// fn first_zone(service: &dyn ResourceService) -> zonekit_core::Result<()> {
//     let zones = service.list_zones(1, 50)?;
//     println!("{} zone(s) on the first page", zones.len());
//     Ok(())
// }
// ```

use serde_json::Value;
use std::rc::Rc;

use crate::types::{Credentials, Fields, NewZone, PurgeRequest, Setting, SettingUpdate};

/// Trait for the remote zone-management API
///
/// Every listing method returns one finite batch for one page. Turning
/// batches into full sequences is the job of [`crate::pagination::Paginator`]
/// and nothing else.
///
/// # Blocking
///
/// All calls block until the remote call completes or fails. The object
/// model never overlaps requests.
///
/// # Failure Reporting
///
/// Implementations report:
/// - [`crate::Error::NotFound`] when a lookup by name or id finds nothing
/// - [`crate::Error::Remote`] for any other failed call, unchanged
///
/// They must not retry, back off or cache: callers see every failure.
pub trait ResourceService {
    /// List one page of zones visible to the account
    ///
    /// # Parameters
    ///
    /// - `page`: Page number (the first page is 1)
    /// - `per_page`: Requested page size
    fn list_zones(&self, page: u64, per_page: usize) -> crate::Result<Vec<Fields>>;

    /// Fetch one zone by id
    fn get_zone(&self, zone_id: &str) -> crate::Result<Fields>;

    /// Fetch one zone by domain name
    ///
    /// # Returns
    ///
    /// - `Ok(Fields)`: The zone's attribute bag
    /// - `Err(Error::NotFound)`: No zone has this name
    fn get_zone_by_name(&self, name: &str) -> crate::Result<Fields>;

    /// Create a zone and return its attribute bag
    fn create_zone(&self, zone: &NewZone) -> crate::Result<Fields>;

    /// Delete a zone
    fn delete_zone(&self, zone_id: &str) -> crate::Result<()>;

    /// List one page of a zone's settings
    fn list_zone_settings(
        &self,
        zone_id: &str,
        page: u64,
        per_page: usize,
    ) -> crate::Result<Vec<Setting>>;

    /// Write several settings in one call
    ///
    /// # Returns
    ///
    /// The settings the server reports after the write
    fn set_zone_settings(
        &self,
        zone_id: &str,
        items: &[SettingUpdate],
    ) -> crate::Result<Vec<Setting>>;

    /// Write one setting
    fn set_zone_setting(
        &self,
        zone_id: &str,
        setting_id: &str,
        value: &Value,
    ) -> crate::Result<Setting>;

    /// List one page of a zone's DNS records
    fn list_dns_records(
        &self,
        zone_id: &str,
        page: u64,
        per_page: usize,
    ) -> crate::Result<Vec<Fields>>;

    /// Create a DNS record from a full field bag
    fn create_dns_record(&self, zone_id: &str, fields: &Fields) -> crate::Result<Fields>;

    /// Replace a DNS record with `fields`
    ///
    /// # Returns
    ///
    /// - `Ok(Fields)`: The record as stored by the server
    /// - `Err(Error::NotFound)`: No record has this id
    fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fields: &Fields,
    ) -> crate::Result<Fields>;

    /// Delete a DNS record
    fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> crate::Result<()>;

    /// List one page of a zone's page rules
    fn list_page_rules(
        &self,
        zone_id: &str,
        page: u64,
        per_page: usize,
    ) -> crate::Result<Vec<Fields>>;

    /// Create a page rule from a full field bag
    fn create_page_rule(&self, zone_id: &str, fields: &Fields) -> crate::Result<Fields>;

    /// Replace a page rule with `fields`
    fn update_page_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        fields: &Fields,
    ) -> crate::Result<Fields>;

    /// Delete a page rule
    fn delete_page_rule(&self, zone_id: &str, rule_id: &str) -> crate::Result<()>;

    /// Purge the zone's edge cache
    fn purge_cache(&self, zone_id: &str, request: &PurgeRequest) -> crate::Result<()>;

    /// Fetch SSL verification details for the zone
    fn get_ssl_verification_info(&self, zone_id: &str) -> crate::Result<Value>;
}

/// Helper trait for binding a Resource Service to a set of credentials
///
/// [`crate::models::Host`] uses it to hand every provisioned or looked-up
/// user its own service instance.
pub trait ResourceServiceFactory {
    /// Create a ResourceService acting on behalf of `credentials`
    fn create(&self, credentials: &Credentials) -> crate::Result<Rc<dyn ResourceService>>;
}

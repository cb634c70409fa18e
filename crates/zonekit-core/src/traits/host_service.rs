//! Host Service trait
//!
//! The Host Service is the reseller-side API: it provisions users, looks
//! them up, and sets up zones on their behalf.

use serde_json::Value;

use crate::types::{HostUser, NewHostUser, UserLookup};

/// Trait for user lifecycle and hosted-zone operations
///
/// Same blocking, no-retry contract as
/// [`ResourceService`](super::ResourceService).
pub trait HostService {
    /// Create a user, or return the existing one with the same email
    fn user_create(&self, user: &NewHostUser) -> crate::Result<HostUser>;

    /// Find an existing user
    ///
    /// # Returns
    ///
    /// - `Ok(HostUser)`: The matching user
    /// - `Err(Error::NotFound)`: No user matches
    fn user_lookup(&self, lookup: &UserLookup) -> crate::Result<HostUser>;

    /// List hosted zones, addressed by item offset
    ///
    /// # Parameters
    ///
    /// - `offset`: Number of zones to skip
    /// - `limit`: Maximum number of zones to return
    fn zone_list(&self, offset: u64, limit: usize) -> crate::Result<Vec<Value>>;

    /// Set up a full (name-server delegated) zone for a user
    fn full_zone_set(&self, zone_name: &str, user_key: &str, jump_start: bool)
    -> crate::Result<Value>;

    /// Set up a CNAME (partial) zone for a user
    ///
    /// # Parameters
    ///
    /// - `zone_name`: The zone
    /// - `user_key`: Host-side key of the owning user
    /// - `subdomains`: Hostnames to route through the provider
    /// - `resolve_to`: Origin the subdomains resolve to
    fn zone_set(
        &self,
        zone_name: &str,
        user_key: &str,
        subdomains: &[String],
        resolve_to: &str,
    ) -> crate::Result<Value>;
}

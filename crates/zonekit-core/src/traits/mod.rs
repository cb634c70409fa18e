//! Core traits for zonekit
//!
//! This module defines the abstract interfaces the object model calls into.
//!
//! - [`ResourceService`]: Zones, settings, DNS records and page rules
//! - [`HostService`]: User provisioning and hosted zones
//! - [`ResourceServiceFactory`]: Binds credentials to a ResourceService

pub mod host_service;
pub mod resource_service;

pub use host_service::HostService;
pub use resource_service::{ResourceService, ResourceServiceFactory};

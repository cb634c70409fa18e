// # zonekit-core
//
// Object model for a DNS/CDN provider's zone-management API.
//
// ## Architecture Overview
//
// This library turns a flat remote API into local objects:
// - **ResourceService / HostService**: Traits for every remote call
// - **Paginator**: One lazy sequence over a paginated listing
// - **User / Zone**: Aggregates owning memoized collections
// - **Record / PageRule**: Proxies that stage edits until `save()`
// - **ZoneSettings**: Staged settings flushed in one batch
// - **Host**: User provisioning through the Host Service
//
// ## Design Principles
//
// 1. **Transport-Free**: The core never performs I/O against the provider;
//    services are injected
// 2. **Lazy**: Nothing is fetched before it is first needed
// 3. **Explicit Invalidation**: Every mutation that changes a collection's
//    membership or order drops that collection's memo, never patches it
// 4. **Single-Threaded**: Aggregates are `Rc` handles and stay on one thread

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use config::ClientConfig;
pub use error::{ApiMessage, Error, RemoteError, Result};
pub use models::{
    Host, NewPageRule, NewRecord, PageRule, Record, RecordMap, User, Zone, ZoneSettings,
};
pub use pagination::Paginator;
pub use traits::{HostService, ResourceService, ResourceServiceFactory};
pub use types::{
    Credentials, Fields, HostUser, NewHostUser, NewZone, PurgeRequest, Setting, SettingUpdate,
    UserLookup,
};

//! Object model over the remote API
//!
//! - [`User`]: An account and its cached zones
//! - [`Zone`]: A zone with cached records and page rules
//! - [`ZoneSettings`]: Staged, batch-flushed zone settings
//! - [`Record`] / [`PageRule`]: Proxies with staged field edits
//! - [`Host`]: User provisioning through the Host Service

mod fields;
pub mod host;
pub mod page_rule;
pub mod record;
pub mod settings;
pub mod user;
pub mod zone;

pub use host::Host;
pub use page_rule::{NewPageRule, PageRule};
pub use record::{NewRecord, Record};
pub use settings::ZoneSettings;
pub use user::{User, UserBuilder};
pub use zone::{RecordMap, Zone};

// # Cloudflare Transport
//
// Blocking HTTP implementations of the zonekit service traits.
//
// ## Services
//
// - **CloudflareService**: `ResourceService` over the v4 REST API
// - **CloudflareServiceFactory**: Binds a `CloudflareService` to credentials
// - **CloudflareHostService**: `HostService` over the Host API
//
// ## Behavior
//
// - One HTTP request per trait call, with a 30 second default timeout
// - No retry, backoff or caching: failures propagate to the caller
// - HTTP 404 maps to `Error::NotFound`; other failures keep their status
//   and the structured `errors` list in `Error::Remote`
//
// ## Security Requirements
//
// - API keys, tokens and the host key NEVER appear in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?page=..&per_page=..`
// - Zone Settings: GET/PATCH `/zones/:zone_id/settings`
// - DNS Records: GET/POST `/zones/:zone_id/dns_records`, PUT/DELETE `/zones/:zone_id/dns_records/:id`
// - Page Rules: GET/POST `/zones/:zone_id/pagerules`, PUT/DELETE `/zones/:zone_id/pagerules/:id`
// - Purge: POST `/zones/:zone_id/purge_cache`
// - SSL: GET `/zones/:zone_id/ssl/verification`

pub mod envelope;
pub mod host;
pub mod requests;
pub mod service;

pub use envelope::{parse_envelope, parse_host_response};
pub use host::CloudflareHostService;
pub use service::{CloudflareService, CloudflareServiceFactory, DEFAULT_HTTP_TIMEOUT};

//! Route handlers for the HTTP API.

pub mod client_config;
pub mod grades;
pub mod health;
pub mod stream;
pub mod streaming_helpers;
pub mod videos;
pub mod view_stats;
pub mod views;

/// Parse a path segment as a typed id. Malformed ids cannot name an
/// existing entity, so they are reported as not found.
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str, entity: &str) -> cr_core::Result<T> {
    raw.parse()
        .map_err(|_| cr_core::Error::not_found(entity, raw))
}

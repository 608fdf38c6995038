//! HTTP middleware: request ID and viewer/admin authentication.

pub mod auth;
pub mod request_id;

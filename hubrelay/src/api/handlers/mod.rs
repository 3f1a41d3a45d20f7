//! HTTP request handlers.
//!
//! - [`github`]: authenticates and relays GitHub webhook deliveries
//! - [`home`]: liveness greeting
//!
//! Handlers return [`crate::errors::Result`], so failures become JSON error
//! responses with the status code each error maps to.

pub mod github;
pub mod home;

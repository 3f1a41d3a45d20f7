//! Inbound side of the relay: GitHub hook authentication and event normalization.
//!
//! - [`signature`]: HMAC-SHA1 `X-Hub-Signature` verification and [`HookContext`]
//! - [`events`]: typed payloads per event kind and [`EventSummary`] normalization

mod error;
pub mod events;
pub mod signature;

pub use error::HookError;
pub use events::{EventKind, EventSummary, GithubEvent, create_event_summary};
pub use signature::{HookContext, HookHeaders, sign_body, verify_signature};

//! Slack side of the relay: mention resolution, message text, and delivery.
//!
//! A summary goes through [`find_accounts`] to pick recipients, through
//! [`EventSummary::with_mentions`](crate::github::EventSummary::with_mentions)
//! and [`compose_post_text`] to build the text, and finally to
//! [`NotificationDispatcher::post_to_accounts`], which posts it once per
//! account via a [`SlackTransport`].

pub mod client;
pub mod dispatcher;
pub mod mentions;
pub mod message;

pub use client::{DeliveryError, SlackClient, SlackTransport};
pub use dispatcher::{Delivery, DispatchReport, NotificationDispatcher, SkipReason};
pub use mentions::{Mentions, find_accounts, is_mention_token, replace_mentions};
pub use message::compose_post_text;

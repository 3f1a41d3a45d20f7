//! Best-effort fan-out of one notification to every mentioned account.
//!
//! ```text
//! post_to_accounts()
//!   ├─ nothing to send? ──► DispatchReport::Skipped
//!   └─ for each (mention, account), at most `max_concurrent_sends` at once:
//!        └─ transport.send(account.channel, text) ──► Delivery { outcome }
//! ```
//!
//! Each send is independent: a failed or slow destination never cancels or
//! reorders the others, and nothing is retried.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use metrics::counter;

use super::client::{DeliveryError, SlackTransport};
use super::mentions::Mentions;
use crate::config::Account;

/// Why no delivery was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRecipients,
    EmptyText,
    MissingRepository,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecipients => write!(f, "no mentioned accounts"),
            Self::EmptyText => write!(f, "empty text"),
            Self::MissingRepository => write!(f, "repository name missing"),
        }
    }
}

/// Outcome of the send to one account.
#[derive(Debug)]
pub struct Delivery {
    pub mention: String,
    pub channel: String,
    pub outcome: Result<String, DeliveryError>,
}

#[derive(Debug)]
pub enum DispatchReport {
    Skipped(SkipReason),
    Dispatched(Vec<Delivery>),
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        match self {
            Self::Skipped(_) => 0,
            Self::Dispatched(deliveries) => deliveries.iter().filter(|d| d.outcome.is_ok()).count(),
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            Self::Skipped(_) => 0,
            Self::Dispatched(deliveries) => deliveries.iter().filter(|d| d.outcome.is_err()).count(),
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn SlackTransport>,
    max_concurrent_sends: usize,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn SlackTransport>, max_concurrent_sends: usize) -> Self {
        Self {
            transport,
            max_concurrent_sends: max_concurrent_sends.max(1),
        }
    }

    /// Send `text` to the channel of every account in `accounts`.
    ///
    /// Never fails: per-account errors are logged and returned in the report.
    pub async fn post_to_accounts(&self, repository_name: &str, text: &str, accounts: &Mentions) -> DispatchReport {
        let skip = if accounts.is_empty() {
            Some(SkipReason::NoRecipients)
        } else if text.is_empty() {
            Some(SkipReason::EmptyText)
        } else if repository_name.is_empty() {
            Some(SkipReason::MissingRepository)
        } else {
            None
        };
        if let Some(reason) = skip {
            tracing::debug!(%reason, "Nothing to send to Slack");
            return DispatchReport::Skipped(reason);
        }

        // Owned pairs keep each send future free of borrows into `accounts`
        let recipients: Vec<(String, Account)> = accounts
            .iter()
            .map(|(mention, account)| (mention.clone(), account.clone()))
            .collect();

        let deliveries = stream::iter(recipients)
            .map(|(mention, account)| async move {
                tracing::debug!(mention = %mention, channel = %account.channel, "Sending to Slack");

                let outcome = self.transport.send(&account.channel, text).await;
                match &outcome {
                    Ok(_) => {
                        counter!("hubrelay_slack_deliveries_total", "outcome" => "success").increment(1);
                        tracing::info!(mention = %mention, channel = %account.channel, "Sent to Slack");
                    }
                    Err(e) => {
                        counter!("hubrelay_slack_deliveries_total", "outcome" => "failure").increment(1);
                        tracing::warn!(mention = %mention, channel = %account.channel, error = %e, "Failed to send to Slack");
                    }
                }

                Delivery {
                    mention,
                    channel: account.channel,
                    outcome,
                }
            })
            .buffer_unordered(self.max_concurrent_sends)
            .collect::<Vec<_>>()
            .await;

        DispatchReport::Dispatched(deliveries)
    }
}

//! GitHub `@mention` resolution and rewriting into Slack mentions.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::config::{Account, Directory};
use crate::github::EventSummary;

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@[a-zA-Z0-9_\-]+").expect("mention pattern is valid"));

/// Resolved mentions, keyed by the token as written (e.g. `@octocat`).
pub type Mentions = BTreeMap<String, Account>;

/// Whether `s` is exactly one mention token.
pub fn is_mention_token(s: &str) -> bool {
    MENTION.find(s).is_some_and(|m| m.start() == 0 && m.end() == s.len())
}

/// Accounts for every mention in `text` that the directory knows about.
///
/// Unknown mentions are skipped; repeated mentions collapse to one entry.
pub fn find_accounts(text: &str, directory: &Directory) -> Mentions {
    MENTION
        .find_iter(text)
        .filter_map(|m| {
            directory
                .account(m.as_str())
                .map(|account| (m.as_str().to_string(), account.clone()))
        })
        .collect()
}

/// Replace each resolved mention with `<id>`.
///
/// Tokens are matched whole, so a resolved `@a` never rewrites part of `@ab`.
pub fn replace_mentions(text: &str, accounts: &Mentions) -> String {
    if accounts.is_empty() {
        return text.to_string();
    }

    MENTION
        .replace_all(text, |caps: &Captures| match accounts.get(&caps[0]) {
            Some(account) => format!("<{}>", account.id),
            None => caps[0].to_string(),
        })
        .into_owned()
}

impl EventSummary {
    /// Copy of this summary with mentions in the comment rewritten.
    pub fn with_mentions(&self, accounts: &Mentions) -> EventSummary {
        EventSummary {
            comment: replace_mentions(&self.comment, accounts),
            ..self.clone()
        }
    }
}

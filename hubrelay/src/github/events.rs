//! GitHub event payloads and their normalization into an [`EventSummary`].
//!
//! Only the fields the relay renders are modelled; everything else in the
//! payload is ignored by serde.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::HookError;

/// The GitHub event types the relay understands, keyed by `X-GitHub-Event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Issues,
    IssueComment,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
}

impl EventKind {
    /// Actions that produce a notification. Anything else is ignored.
    pub fn accepted_actions(self) -> &'static [&'static str] {
        match self {
            Self::Issues | Self::PullRequest => &["opened", "edited"],
            Self::IssueComment | Self::PullRequestReviewComment => &["created", "edited"],
            Self::PullRequestReview => &["submitted", "edited"],
        }
    }

    pub fn accepts(self, action: &str) -> bool {
        self.accepted_actions().contains(&action)
    }

    /// Noun used in the summary description, e.g. "Issue opened by: octocat".
    pub fn label(self) -> &'static str {
        match self {
            Self::Issues => "Issue",
            Self::IssueComment | Self::PullRequestReviewComment => "Comment",
            Self::PullRequest => "PullRequest",
            Self::PullRequestReview => "Review",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issues => write!(f, "issues"),
            Self::IssueComment => write!(f, "issue_comment"),
            Self::PullRequest => write!(f, "pull_request"),
            Self::PullRequestReview => write!(f, "pull_request_review"),
            Self::PullRequestReviewComment => write!(f, "pull_request_review_comment"),
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issues" => Ok(Self::Issues),
            "issue_comment" => Ok(Self::IssueComment),
            "pull_request" => Ok(Self::PullRequest),
            "pull_request_review" => Ok(Self::PullRequestReview),
            "pull_request_review_comment" => Ok(Self::PullRequestReviewComment),
            _ => Err(HookError::UnhandledEvent(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// An issue or pull request that is the subject of the event.
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub title: String,
    pub html_url: String,
    pub user: User,
    /// GitHub sends `null` for an empty description.
    pub body: Option<String>,
}

/// Parent issue or pull request of a comment or review; only its title is rendered.
#[derive(Debug, Clone, Deserialize)]
pub struct Parent {
    pub title: String,
}

/// A comment or review attached to a [`Parent`].
#[derive(Debug, Clone, Deserialize)]
pub struct Note {
    pub html_url: String,
    pub user: User,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub repository: Repository,
    pub issue: Thread,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub repository: Repository,
    pub issue: Parent,
    pub comment: Note,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub repository: Repository,
    pub pull_request: Thread,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: String,
    pub repository: Repository,
    pub pull_request: Parent,
    pub review: Note,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: String,
    pub repository: Repository,
    pub pull_request: Parent,
    pub comment: Note,
}

/// Just enough of any payload to decide whether it is worth decoding fully.
#[derive(Deserialize)]
struct Envelope {
    action: String,
}

/// A decoded GitHub event, one variant per [`EventKind`].
#[derive(Debug, Clone)]
pub enum GithubEvent {
    Issues(IssuesEvent),
    IssueComment(IssueCommentEvent),
    PullRequest(PullRequestEvent),
    PullRequestReview(PullRequestReviewEvent),
    PullRequestReviewComment(PullRequestReviewCommentEvent),
}

impl GithubEvent {
    pub fn from_payload(kind: EventKind, payload: &[u8]) -> Result<Self, HookError> {
        Ok(match kind {
            EventKind::Issues => Self::Issues(decode(kind, payload)?),
            EventKind::IssueComment => Self::IssueComment(decode(kind, payload)?),
            EventKind::PullRequest => Self::PullRequest(decode(kind, payload)?),
            EventKind::PullRequestReview => Self::PullRequestReview(decode(kind, payload)?),
            EventKind::PullRequestReviewComment => Self::PullRequestReviewComment(decode(kind, payload)?),
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Issues(_) => EventKind::Issues,
            Self::IssueComment(_) => EventKind::IssueComment,
            Self::PullRequest(_) => EventKind::PullRequest,
            Self::PullRequestReview(_) => EventKind::PullRequestReview,
            Self::PullRequestReviewComment(_) => EventKind::PullRequestReviewComment,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Issues(e) => &e.action,
            Self::IssueComment(e) => &e.action,
            Self::PullRequest(e) => &e.action,
            Self::PullRequestReview(e) => &e.action,
            Self::PullRequestReviewComment(e) => &e.action,
        }
    }

    /// Normalize into a summary, rejecting actions the kind does not accept.
    pub fn into_summary(self) -> Result<EventSummary, HookError> {
        let kind = self.kind();
        if !kind.accepts(self.action()) {
            return Err(HookError::UnhandledAction {
                event: kind.to_string(),
                action: self.action().to_string(),
            });
        }

        let (action, repository, title, url, user, body) = match self {
            Self::Issues(e) => (e.action, e.repository, e.issue.title, e.issue.html_url, e.issue.user, e.issue.body),
            Self::PullRequest(e) => (
                e.action,
                e.repository,
                e.pull_request.title,
                e.pull_request.html_url,
                e.pull_request.user,
                e.pull_request.body,
            ),
            Self::IssueComment(e) => (e.action, e.repository, e.issue.title, e.comment.html_url, e.comment.user, e.comment.body),
            Self::PullRequestReview(e) => (
                e.action,
                e.repository,
                e.pull_request.title,
                e.review.html_url,
                e.review.user,
                e.review.body,
            ),
            Self::PullRequestReviewComment(e) => (
                e.action,
                e.repository,
                e.pull_request.title,
                e.comment.html_url,
                e.comment.user,
                e.comment.body,
            ),
        };

        Ok(EventSummary {
            repository_name: repository.name,
            title,
            url,
            description: format!("{} {} by: {}", kind.label(), action, user.login),
            comment: body.unwrap_or_default(),
        })
    }
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: &[u8]) -> Result<T, HookError> {
    serde_json::from_slice(payload).map_err(|source| HookError::MalformedPayload {
        event: kind.to_string(),
        source,
    })
}

/// Event-agnostic view of one hook, as rendered into a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub repository_name: String,
    pub title: String,
    /// Points at the comment or review itself, not its parent thread.
    pub url: String,
    /// `"<Kind> <action> by: <login>"`
    pub description: String,
    /// Free text that is scanned for mentions.
    pub comment: String,
}

/// Classify and normalize a raw payload.
///
/// The action is checked before the full payload is decoded, so ignored
/// actions never surface as parse failures.
pub fn create_event_summary(event: &str, payload: &[u8]) -> Result<EventSummary, HookError> {
    let kind: EventKind = event.parse()?;

    let Envelope { action } = decode(kind, payload)?;
    if !kind.accepts(&action) {
        return Err(HookError::UnhandledAction {
            event: kind.to_string(),
            action,
        });
    }

    GithubEvent::from_payload(kind, payload)?.into_summary()
}

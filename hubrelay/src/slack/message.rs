//! Slack message rendering and the incoming-webhook wire format.

use crate::github::EventSummary;

/// Content type Slack incoming webhooks accept the `payload` form field with.
pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Render the notification text.
///
/// ```text
/// *[<repository>] <title>*
/// <url>
/// > <description>
/// <comment>
/// ```
pub fn compose_post_text(summary: &EventSummary) -> String {
    format!(
        "*[{}] {}*\n{}\n> {}\n{}",
        summary.repository_name, summary.title, summary.url, summary.description, summary.comment
    )
}

/// Form-encoded request body: `payload=<urlencoded {"text": ...}>`.
pub fn form_body(text: &str) -> Result<String, serde_urlencoded::ser::Error> {
    let payload = serde_json::json!({ "text": text }).to_string();
    serde_urlencoded::to_string([("payload", payload)])
}

//! End-to-end handling of one authenticated hook.

use crate::config::Directory;
use crate::github::{HookContext, HookError, create_event_summary};
use crate::slack::{DispatchReport, NotificationDispatcher, compose_post_text, find_accounts};

/// Normalize the hook, resolve its mentions, and post the rendered text to
/// every mentioned account.
///
/// Classification errors are returned before anything is sent. Delivery
/// failures never surface here; they are reported per account in the
/// [`DispatchReport`].
#[tracing::instrument(skip_all, fields(event = hook.event(), delivery_id = hook.delivery_id()))]
pub async fn relay_hook(
    directory: &Directory,
    hook: &HookContext,
    dispatcher: &NotificationDispatcher,
) -> Result<DispatchReport, HookError> {
    let summary = create_event_summary(hook.event(), hook.payload())?;

    let accounts = find_accounts(&summary.comment, directory);
    tracing::debug!(
        repository = %summary.repository_name,
        mentioned = accounts.len(),
        "Resolved mentions"
    );

    let text = compose_post_text(&summary.with_mentions(&accounts));

    Ok(dispatcher.post_to_accounts(&summary.repository_name, &text, &accounts).await)
}
